//! Session input: key commands from stdin plus OS shutdown signals

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

/// Commands driving the interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start or stop recording
    Toggle,
    /// Upload the recording for conversion
    Convert,
    /// Save the recording without conversion
    SaveRaw,
    /// Show the current state
    Status,
    /// Leave the session (also SIGINT/SIGTERM and end of input)
    Quit,
}

impl SessionCommand {
    /// Parse one line of input. Unknown input yields None.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" | "t" | "toggle" | "r" | "record" => Some(Self::Toggle),
            "u" | "upload" | "c" | "convert" => Some(Self::Convert),
            "w" | "save" => Some(Self::SaveRaw),
            "s" | "status" => Some(Self::Status),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// One item of session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Command(SessionCommand),
    /// A line that matched no command
    Unknown(String),
}

/// Merges stdin commands and shutdown signals into one stream
pub struct SessionInput {
    receiver: mpsc::Receiver<SessionEvent>,
    forced: Arc<Notify>,
}

impl SessionInput {
    /// Start listening on stdin and for shutdown signals
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(10);
        let forced = Arc::new(Notify::new());

        spawn_shutdown_listener(ShutdownRelay::new(tx.clone(), Arc::clone(&forced)))?;

        // A plain thread: a pending stdin read must not hold up runtime shutdown
        std::thread::Builder::new()
            .name("session-input".to_string())
            .spawn(move || read_commands(std::io::stdin().lock(), tx))?;

        Ok(Self {
            receiver: rx,
            forced,
        })
    }

    /// Wait for the next event. None once every source is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Handle that resolves once a repeated shutdown signal demands exit
    /// without cleanup
    pub fn forced_exit(&self) -> ForcedExit {
        ForcedExit(Arc::clone(&self.forced))
    }
}

/// Fires when shutdown must skip the orderly stop
#[derive(Clone)]
pub struct ForcedExit(Arc<Notify>);

impl ForcedExit {
    pub async fn wait(&self) {
        self.0.notified().await
    }
}

/// Turns shutdown signals into session events.
///
/// The first signal asks for an orderly quit. Any later one, or a first
/// one that cannot be queued, forces exit.
struct ShutdownRelay {
    events: mpsc::Sender<SessionEvent>,
    forced: Arc<Notify>,
    quit_sent: bool,
}

impl ShutdownRelay {
    fn new(events: mpsc::Sender<SessionEvent>, forced: Arc<Notify>) -> Self {
        Self {
            events,
            forced,
            quit_sent: false,
        }
    }

    fn signal(&mut self) {
        if !self.quit_sent {
            self.quit_sent = true;
            if self
                .events
                .try_send(SessionEvent::Command(SessionCommand::Quit))
                .is_ok()
            {
                return;
            }
        }
        warn!("shutdown signal repeated; forcing exit");
        self.forced.notify_one();
    }
}

/// Forward parsed lines from `input`; end of input counts as quit.
/// Blocks the calling thread.
fn read_commands<R: BufRead>(input: R, tx: mpsc::Sender<SessionEvent>) {
    let mut lines = input.lines();
    loop {
        let event = match lines.next() {
            Some(Ok(line)) => match SessionCommand::parse(&line) {
                Some(command) => SessionEvent::Command(command),
                None => SessionEvent::Unknown(line),
            },
            None => SessionEvent::Command(SessionCommand::Quit),
            Some(Err(e)) => {
                debug!(error = %e, "stdin read failed");
                SessionEvent::Command(SessionCommand::Quit)
            }
        };

        let quit = event == SessionEvent::Command(SessionCommand::Quit);
        if tx.blocking_send(event).is_err() || quit {
            break;
        }
    }
}

#[cfg(unix)]
fn spawn_shutdown_listener(mut relay: ShutdownRelay) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = sigint.recv() => debug!("received SIGINT"),
                Some(()) = sigterm.recv() => debug!("received SIGTERM"),
                else => break,
            }
            relay.signal();
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_shutdown_listener(mut relay: ShutdownRelay) -> Result<(), std::io::Error> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            relay.signal();
        }
    });
    Ok(())
}
