//! File storage adapters

mod directory;

pub use directory::DirectorySaver;
