//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::DisplaySnapshot;
use crate::domain::upload::StatusKind;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// How-to shown before the session starts
    pub fn intro(&self) {
        eprintln!("{}", "Screencast".bold());
        eprintln!("  Records the screen together with the microphone.");
        eprintln!("  Starting a recording asks for both devices; if either one is");
        eprintln!("  unavailable nothing is recorded.");
        eprintln!();
    }

    /// Print the current session state and the available keys
    pub fn snapshot(&self, snapshot: &DisplaySnapshot, can_submit: bool) {
        eprintln!("{}", Self::format_status(snapshot));
        if let Some(message) = &snapshot.status_message {
            match message.kind {
                StatusKind::Success => self.success(&message.text),
                StatusKind::Failure => self.error(&message.text),
            }
        }
        self.actions(snapshot, can_submit);
    }

    /// Print only the available keys
    pub fn actions(&self, snapshot: &DisplaySnapshot, can_submit: bool) {
        eprintln!("{}", Self::format_actions(snapshot, can_submit).dimmed());
    }

    /// One-line recording state
    pub fn format_status(snapshot: &DisplaySnapshot) -> String {
        if snapshot.recording {
            format!("{} Recording ({} chunks)", "●".red(), snapshot.chunk_count)
        } else if snapshot.loading {
            format!("{} Converting...", "◌".cyan())
        } else if snapshot.chunk_count > 0 {
            format!("{} Recorded {} chunks", "■".cyan(), snapshot.chunk_count)
        } else {
            format!("{} Nothing recorded", "○".dimmed())
        }
    }

    /// Keys valid in the current state
    pub fn format_actions(snapshot: &DisplaySnapshot, can_submit: bool) -> String {
        let mut actions = Vec::new();
        if !snapshot.loading {
            actions.push(if snapshot.recording {
                "[Enter] stop"
            } else {
                "[Enter] record"
            });
        }
        if can_submit {
            actions.push("[u] convert to MP4");
            actions.push("[w] save WebM");
        }
        actions.push("[s] status");
        actions.push("[q] quit");
        actions.join("  ")
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
