//! FFmpeg-based recording engine adapter
//!
//! Encodes the combined display and microphone inputs to WebM (VP8 + Opus)
//! and streams the container bytes from stdout into the chunk sink.

use std::process::{ExitStatus, Stdio};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::ports::{ChunkSink, EngineHandle, RecordingEngine, RecordingError};
use crate::domain::media::{CombinedStream, TrackKind};
use crate::domain::recording::Chunk;

/// Size of each stdout read; one read becomes one chunk
pub const CHUNK_READ_SIZE: usize = 64 * 1024;

/// FFmpeg exits with this code after a graceful SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 255;

/// How long ffmpeg has to fail on bad inputs before start reports success
const STARTUP_GRACE: StdDuration = StdDuration::from_millis(300);

/// How long ffmpeg gets to write the trailer and exit after SIGINT
const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

const VIDEO_FRAMERATE: &str = "30";

/// FFmpeg recording engine
pub struct FfmpegEngine {
    program: String,
}

impl FfmpegEngine {
    /// Create an engine that runs `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Create an engine that runs the given executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build FFmpeg args for recording `stream` to WebM on stdout
    fn build_ffmpeg_args(stream: &CombinedStream) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // One input per track, in stream order
        for track in stream.tracks() {
            args.extend(["-thread_queue_size".to_string(), "512".to_string()]);
            if track.kind() == TrackKind::Video {
                args.extend(["-framerate".to_string(), VIDEO_FRAMERATE.to_string()]);
            }
            args.extend([
                "-f".to_string(),
                track.input().format.clone(),
                "-i".to_string(),
                track.input().target.clone(),
            ]);
        }

        for (index, track) in stream.tracks().iter().enumerate() {
            let selector = match track.kind() {
                TrackKind::Video => "v",
                TrackKind::Audio => "a",
            };
            args.extend(["-map".to_string(), format!("{}:{}", index, selector)]);
        }

        args.extend([
            "-c:v".to_string(),
            "libvpx".to_string(), // VP8
            "-deadline".to_string(),
            "realtime".to_string(),
            "-cpu-used".to_string(),
            "8".to_string(),
            "-b:v".to_string(),
            "2M".to_string(),
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-f".to_string(),
            "webm".to_string(),
            "pipe:1".to_string(),
        ]);

        args
    }

    /// Spawn FFmpeg process
    fn spawn_ffmpeg(&self, args: Vec<String>) -> Result<Child, RecordingError> {
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Keep Ctrl+C in the terminal from reaching the encoder directly
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecordingError::EncoderNotFound
                } else {
                    RecordingError::StartFailed(e.to_string())
                }
            })
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordingEngine for FfmpegEngine {
    async fn start(
        &self,
        stream: &CombinedStream,
        sink: ChunkSink,
    ) -> Result<Box<dyn EngineHandle>, RecordingError> {
        if stream.tracks().is_empty() {
            return Err(RecordingError::StartFailed(
                "Stream has no tracks".to_string(),
            ));
        }

        let args = Self::build_ffmpeg_args(stream);
        debug!(program = %self.program, ?args, "spawning encoder");
        let child = self.spawn_ffmpeg(args)?;
        let mut handle = FfmpegHandle::attach(child, sink, STOP_TIMEOUT)?;

        // Bad devices make ffmpeg exit right away
        match tokio::time::timeout(STARTUP_GRACE, handle.child.wait()).await {
            Ok(Ok(status)) => {
                handle.reader.abort();
                let stderr = handle.diagnostics.await.unwrap_or_default();
                return Err(RecordingError::StartFailed(exit_message(status, &stderr)));
            }
            Ok(Err(e)) => {
                handle.reader.abort();
                return Err(RecordingError::StartFailed(e.to_string()));
            }
            Err(_) => {}
        }

        Ok(Box::new(handle))
    }
}

/// A running ffmpeg process
struct FfmpegHandle {
    child: Child,
    reader: JoinHandle<std::io::Result<usize>>,
    diagnostics: JoinHandle<String>,
    stop_timeout: StdDuration,
}

impl FfmpegHandle {
    /// Start forwarding the child's stdout to `sink` and collecting stderr
    fn attach(
        mut child: Child,
        sink: ChunkSink,
        stop_timeout: StdDuration,
    ) -> Result<Self, RecordingError> {
        let stdout = child.stdout.take().ok_or_else(|| {
            RecordingError::StartFailed("Encoder stdout not captured".to_string())
        })?;
        let stderr = child.stderr.take();

        let reader = tokio::spawn(pump_chunks(stdout, sink));
        let diagnostics = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        Ok(Self {
            child,
            reader,
            diagnostics,
            stop_timeout,
        })
    }

    /// Ask ffmpeg to stop; it writes the container trailer before exiting
    #[cfg(unix)]
    fn interrupt(child: &mut Child) -> Result<(), RecordingError> {
        use nix::errno::Errno;
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            match signal::kill(Pid::from_raw(id as i32), Signal::SIGINT) {
                // Already gone
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => {
                    return Err(RecordingError::RecordingFailed(format!(
                        "Signal failed: {}",
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn interrupt(child: &mut Child) -> Result<(), RecordingError> {
        child
            .start_kill()
            .map_err(|e| RecordingError::RecordingFailed(format!("Kill failed: {}", e)))
    }
}

#[async_trait]
impl EngineHandle for FfmpegHandle {
    async fn finalize(self: Box<Self>) -> Result<(), RecordingError> {
        let FfmpegHandle {
            mut child,
            reader,
            diagnostics,
            stop_timeout,
        } = *self;

        Self::interrupt(&mut child)?;

        let wait_failed =
            |e: std::io::Error| RecordingError::RecordingFailed(format!("FFmpeg failed: {}", e));
        let mut killed = false;
        let status = match tokio::time::timeout(stop_timeout, child.wait()).await {
            Ok(status) => status.map_err(wait_failed)?,
            Err(_) => {
                warn!(timeout = ?stop_timeout, "encoder ignored SIGINT; killing it");
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "kill failed");
                }
                killed = true;
                child.wait().await.map_err(wait_failed)?
            }
        };

        // Drain stdout to EOF; the sink closes when the reader returns
        let streamed = reader
            .await
            .map_err(|e| RecordingError::RecordingFailed(e.to_string()))?
            .map_err(|e| RecordingError::RecordingFailed(format!("Read failed: {}", e)))?;

        let stderr = diagnostics.await.unwrap_or_default();
        debug!(bytes = streamed, %status, "encoder finished");

        if killed {
            Err(RecordingError::RecordingFailed(format!(
                "FFmpeg did not stop within {:?} and was killed; the recording may be incomplete",
                stop_timeout
            )))
        } else if status.success() || status.code() == Some(INTERRUPTED_EXIT_CODE) {
            Ok(())
        } else {
            Err(RecordingError::RecordingFailed(exit_message(status, &stderr)))
        }
    }
}

/// Forward `reader` to `sink`, one read per chunk, until EOF.
///
/// Returns the number of bytes forwarded.
async fn pump_chunks<R>(mut reader: R, sink: ChunkSink) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut total = 0;
    loop {
        let mut buf = vec![0u8; CHUNK_READ_SIZE];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        buf.truncate(n);
        total += n;
        if sink.send(Chunk::from(buf)).await.is_err() {
            warn!("chunk receiver closed; discarding encoder output");
            break;
        }
    }
    Ok(total)
}

fn exit_message(status: ExitStatus, stderr: &str) -> String {
    match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(line) => format!("FFmpeg exited with error: {}", line.trim()),
        None => format!("FFmpeg exited with {}", status),
    }
}
