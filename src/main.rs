//! Screencast CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use screencast::cli::{
    app::{load_merged_config, resolve_options, run_session, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use screencast::domain::config::{AppConfig, CaptureConfig};
use screencast::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let capture = if cli.display.is_some() || cli.microphone.is_some() {
        Some(CaptureConfig {
            display: cli.display.clone(),
            microphone: cli.microphone.clone(),
        })
    } else {
        None
    };
    let cli_config = AppConfig {
        endpoint: cli.endpoint.clone(),
        upload_timeout: cli.timeout.clone(),
        message_duration: None,
        output_dir: cli.output_dir.clone(),
        notify: if cli.notify { Some(true) } else { None },
        capture,
    };

    let config = load_merged_config(cli_config).await;

    let options = match resolve_options(&config) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    run_session(options).await
}
