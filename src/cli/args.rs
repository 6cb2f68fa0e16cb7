//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;

/// Screencast - record the screen and microphone, convert to MP4
#[derive(Parser, Debug)]
#[command(name = "screencast")]
#[command(version)]
#[command(about = "Record the screen and microphone, then convert the recording to MP4")]
#[command(long_about = None)]
pub struct Cli {
    /// Conversion service origin (e.g., https://host:3000)
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Directory saved files are written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Upload timeout (e.g., 30s, 2m)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// X11 display to capture (e.g., :0.0)
    #[arg(long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// PulseAudio source to record from
    #[arg(long, value_name = "SOURCE")]
    pub microphone: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Resolved options for an interactive session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub endpoint: String,
    pub upload_timeout: Duration,
    pub message_duration: Duration,
    pub output_dir: PathBuf,
    pub display: String,
    pub microphone: String,
    pub notify: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "endpoint",
    "upload_timeout",
    "message_duration",
    "output_dir",
    "notify",
    "capture.display",
    "capture.microphone",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
