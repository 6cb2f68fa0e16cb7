//! Configuration domain module

mod app_config;

pub use app_config::{
    AppConfig, CaptureConfig, DEFAULT_DISPLAY, DEFAULT_ENDPOINT, DEFAULT_MICROPHONE,
};
