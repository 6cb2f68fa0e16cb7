//! Interactive session runner

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ports::{ConfigStore, Notifier};
use crate::application::{
    CaptureSession, ControllerError, RecorderController, ToggleOutcome, UploadConfig,
    UploadOrchestrator,
};
use crate::domain::config::AppConfig;
use crate::domain::recording::Duration;
use crate::domain::upload::{CONVERTED_FILE_NAME, FAILURE_MESSAGE, SUCCESS_MESSAGE};
use crate::infrastructure::{
    create_notifier, DirectorySaver, FfmpegEngine, HttpConversionClient, PulseMicrophoneGrant,
    X11DisplayGrant, XdgConfigStore,
};

use super::args::SessionOptions;
use super::presenter::Presenter;
use super::signals::{SessionCommand, SessionEvent, SessionInput};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How often a running recording is checked for an encoder that quit
const ENGINE_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// What woke the session loop
enum LoopStep {
    Input(Option<SessionEvent>),
    EngineCheck,
    Forced,
}

/// Environment variable overriding the configured endpoint
pub const ENDPOINT_ENV: &str = "SCREENCAST_ENDPOINT";

type SessionController = RecorderController<
    X11DisplayGrant,
    PulseMicrophoneGrant,
    FfmpegEngine,
    HttpConversionClient,
    Arc<DirectorySaver>,
    Box<dyn Notifier>,
>;

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        debug!(error = %e, "config file not loaded");
        AppConfig::empty()
    });

    let env_config = AppConfig {
        endpoint: env::var(ENDPOINT_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Resolve session options from the merged config.
/// Malformed durations are reported instead of silently defaulted.
pub fn resolve_options(config: &AppConfig) -> Result<SessionOptions, String> {
    let upload_timeout = parse_duration("timeout", config.upload_timeout.as_deref())?
        .unwrap_or_else(Duration::default_upload_timeout);
    let message_duration = parse_duration("message duration", config.message_duration.as_deref())?
        .unwrap_or_else(Duration::default_message_duration);

    Ok(SessionOptions {
        endpoint: config.endpoint_or_default(),
        upload_timeout,
        message_duration,
        output_dir: config.output_dir_or_default(),
        display: config.display_or_default(),
        microphone: config.microphone_or_default().to_string(),
        notify: config.notify_or_default(),
    })
}

fn parse_duration(what: &str, value: Option<&str>) -> Result<Option<Duration>, String> {
    value
        .map(|s| {
            s.parse::<Duration>()
                .map_err(|e| format!("Invalid {}: {}", what, e))
        })
        .transpose()
}

/// Run the interactive record / convert session until quit
pub async fn run_session(options: SessionOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let client = match HttpConversionClient::new(&options.endpoint, options.upload_timeout) {
        Ok(client) => client,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut input = match SessionInput::new() {
        Ok(input) => input,
        Err(e) => {
            presenter.error(&format!("Failed to set up input: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let saver = Arc::new(DirectorySaver::new(&options.output_dir));
    let capture = CaptureSession::new(
        X11DisplayGrant::new(&options.display),
        PulseMicrophoneGrant::new(&options.microphone),
        FfmpegEngine::new(),
    );
    let uploads = UploadOrchestrator::new(
        client,
        Arc::clone(&saver),
        create_notifier(options.notify, options.message_duration),
        UploadConfig {
            artifact_file_name: CONVERTED_FILE_NAME.to_string(),
            message_duration: options.message_duration,
            enable_notify: options.notify,
        },
    );
    let mut controller: SessionController = RecorderController::new(capture, uploads, saver);

    info!(
        endpoint = %options.endpoint,
        output_dir = %options.output_dir.display(),
        display = %options.display,
        microphone = %options.microphone,
        "session started"
    );

    presenter.intro();
    presenter.info(&format!("Saving to {}", options.output_dir.display()));
    presenter.snapshot(&controller.snapshot(), controller.can_submit());

    let forced_exit = input.forced_exit();
    let mut engine_watch = tokio::time::interval(ENGINE_CHECK_INTERVAL);
    engine_watch.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let step = tokio::select! {
            event = input.recv() => LoopStep::Input(event),
            _ = engine_watch.tick() => LoopStep::EngineCheck,
            _ = forced_exit.wait() => LoopStep::Forced,
        };

        match step {
            LoopStep::Input(None) => break,
            LoopStep::Input(Some(SessionEvent::Command(SessionCommand::Quit))) => break,
            LoopStep::Input(Some(SessionEvent::Command(command))) => {
                let forced = tokio::select! {
                    _ = handle_command(&mut controller, &mut presenter, command) => false,
                    _ = forced_exit.wait() => true,
                };
                if forced {
                    return abandon_session(&mut presenter);
                }
            }
            LoopStep::Input(Some(SessionEvent::Unknown(line))) => {
                presenter.warn(&format!("Unknown command '{}'", line.trim()));
                presenter.actions(&controller.snapshot(), controller.can_submit());
            }
            LoopStep::EngineCheck => {
                if let Some(result) = controller.check_engine().await {
                    report_engine_end(&controller, &presenter, result);
                }
            }
            LoopStep::Forced => return abandon_session(&mut presenter),
        }
    }

    if controller.capture().is_active() {
        presenter.info("Stopping recording...");
    }
    let shutdown = tokio::select! {
        result = controller.shutdown() => Some(result),
        _ = forced_exit.wait() => None,
    };
    match shutdown {
        Some(Ok(())) => ExitCode::from(EXIT_SUCCESS),
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
        None => abandon_session(&mut presenter),
    }
}

/// Leave without cleanup. Dropping the session kills the encoder and
/// releases the capture devices.
fn abandon_session(presenter: &mut Presenter) -> ExitCode {
    if presenter.is_spinner_active() {
        presenter.spinner_fail("Interrupted");
    }
    warn!("forced exit");
    presenter.warn("Forced exit, unsaved recording discarded");
    ExitCode::from(EXIT_ERROR)
}

fn report_engine_end(
    controller: &SessionController,
    presenter: &Presenter,
    result: Result<ToggleOutcome, ControllerError>,
) {
    match result {
        Ok(_) => presenter.warn("Recording ended unexpectedly"),
        Err(e) => presenter.error(&format!("Recording ended unexpectedly: {}", e)),
    }
    if controller.can_submit() {
        presenter.info("What was captured so far is kept");
    }
    presenter.actions(&controller.snapshot(), controller.can_submit());
}

async fn handle_command(
    controller: &mut SessionController,
    presenter: &mut Presenter,
    command: SessionCommand,
) {
    match command {
        SessionCommand::Toggle => match controller.toggle_recording().await {
            Ok(ToggleOutcome::Started) => presenter.success("Recording screen and microphone"),
            Ok(ToggleOutcome::Stopped { chunks, size }) => {
                if chunks == 0 {
                    presenter.warn("Recording stopped, nothing was captured");
                } else {
                    presenter.success(&format!("Recording stopped ({} chunks, {})", chunks, size));
                }
            }
            Err(ControllerError::Capture(e)) if e.is_source_acquisition() => {
                presenter.error(&e.to_string());
                presenter.info("Recording not started");
            }
            Err(e) => presenter.error(&e.to_string()),
        },
        SessionCommand::Convert => {
            let snapshot = controller.snapshot();
            if !controller.can_submit() {
                let reason = if snapshot.recording {
                    ControllerError::RecordingActive
                } else {
                    ControllerError::NothingRecorded
                };
                presenter.warn(&reason.to_string());
                return;
            }

            presenter.start_spinner("Converting recording...");
            match controller.submit_for_conversion().await {
                Ok(output) => {
                    presenter.spinner_success(SUCCESS_MESSAGE);
                    presenter.info(&format!("Saved {} ({})", output.path.display(), output.size));
                }
                Err(e) => {
                    presenter.spinner_fail(FAILURE_MESSAGE);
                    presenter.error(&e.to_string());
                    presenter.info("The recording is kept, try again or save it as WebM");
                }
            }
        }
        SessionCommand::SaveRaw => match controller.save_raw_recording().await {
            Ok(path) => presenter.success(&format!("Saved {}", path.display())),
            Err(e) => presenter.error(&e.to_string()),
        },
        SessionCommand::Status => {
            presenter.snapshot(&controller.snapshot(), controller.can_submit());
            return;
        }
        SessionCommand::Quit => return,
    }

    presenter.actions(&controller.snapshot(), controller.can_submit());
}
