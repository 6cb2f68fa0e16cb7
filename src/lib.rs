//! Screencast - screen and microphone recorder with MP4 conversion
//!
//! This crate records the screen together with the microphone into an
//! in-memory WebM recording, uploads finished recordings to a conversion
//! service and saves the MP4 it returns.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Recording lifecycle, chunk buffer, media tracks, upload status
//! - **Application**: Capture session, upload orchestrator, controller and port traits
//! - **Infrastructure**: Adapter implementations (FFmpeg, X11, PulseAudio, HTTP, files)
//! - **CLI**: Command-line interface, argument parsing, and session input

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
