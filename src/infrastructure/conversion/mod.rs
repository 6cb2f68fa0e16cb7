//! Conversion service adapters

mod http;

pub use http::HttpConversionClient;
