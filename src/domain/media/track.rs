//! Granted media sources and the combined stream fed to the recording engine

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Kind of data a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which grant a source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Screen / display capture
    Display,
    /// Microphone capture
    Microphone,
}

impl SourceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Microphone => "microphone",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the recording engine opens a track: an input format and a device target
/// (e.g. `x11grab` + `:0.0`, or `pulse` + `default`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub format: String,
    pub target: String,
}

impl InputSpec {
    pub fn new(format: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            target: target.into(),
        }
    }
}

/// A single live track handle.
///
/// Clones share liveness: stopping any clone ends the track for all of them.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    label: String,
    input: InputSpec,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>, input: InputSpec) -> Self {
        Self {
            kind,
            label: label.into(),
            input,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn input(&self) -> &InputSpec {
        &self.input
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// End the track. Idempotent.
    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// A granted capture source and the tracks it carries.
///
/// All tracks are stopped when the source is released or dropped.
#[derive(Debug)]
pub struct MediaSource {
    kind: SourceKind,
    tracks: Vec<MediaTrack>,
}

impl MediaSource {
    pub fn new(kind: SourceKind, tracks: Vec<MediaTrack>) -> Self {
        Self { kind, tracks }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Tracks of the given kind, in grant order
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// True while at least one track is still live
    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stop every track of this source
    pub fn release(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// The stream handed to the recording engine: video tracks from the display
/// source followed by audio tracks from the microphone source.
#[derive(Debug, Clone)]
pub struct CombinedStream {
    tracks: Vec<MediaTrack>,
}

impl CombinedStream {
    /// Compose a stream from the two grants. Audio carried by the display
    /// source and video carried by the microphone source are dropped.
    pub fn compose(display: &MediaSource, microphone: &MediaSource) -> Self {
        let tracks = display
            .tracks_of(TrackKind::Video)
            .chain(microphone.tracks_of(TrackKind::Audio))
            .cloned()
            .collect();
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    pub fn has_video(&self) -> bool {
        self.video_tracks().next().is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_tracks().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(kind: TrackKind, label: &str) -> MediaTrack {
        MediaTrack::new(kind, label, InputSpec::new("test", label))
    }

    #[test]
    fn stopping_a_clone_ends_the_track() {
        let original = track(TrackKind::Video, "screen");
        let clone = original.clone();
        assert!(original.is_live());

        clone.stop();
        assert!(!original.is_live());
    }

    #[test]
    fn release_stops_all_tracks() {
        let video = track(TrackKind::Video, "screen");
        let audio = track(TrackKind::Audio, "system");
        let source = MediaSource::new(SourceKind::Display, vec![video.clone(), audio.clone()]);

        source.release();
        assert!(!source.is_live());
        assert!(!video.is_live());
        assert!(!audio.is_live());
    }

    #[test]
    fn drop_releases_source() {
        let video = track(TrackKind::Video, "screen");
        {
            let _source = MediaSource::new(SourceKind::Display, vec![video.clone()]);
        }
        assert!(!video.is_live());
    }

    #[test]
    fn compose_takes_video_from_display_and_audio_from_microphone() {
        let display = MediaSource::new(
            SourceKind::Display,
            vec![
                track(TrackKind::Video, "screen"),
                track(TrackKind::Audio, "tab-audio"),
            ],
        );
        let microphone = MediaSource::new(
            SourceKind::Microphone,
            vec![
                track(TrackKind::Audio, "mic"),
                track(TrackKind::Video, "webcam"),
            ],
        );

        let stream = CombinedStream::compose(&display, &microphone);
        let labels: Vec<&str> = stream.tracks().iter().map(MediaTrack::label).collect();

        assert_eq!(labels, vec!["screen", "mic"]);
        assert!(stream.has_video());
        assert!(stream.has_audio());
    }

    #[test]
    fn compose_without_audio_reports_missing_kind() {
        let display = MediaSource::new(SourceKind::Display, vec![track(TrackKind::Video, "screen")]);
        let microphone = MediaSource::new(SourceKind::Microphone, vec![]);

        let stream = CombinedStream::compose(&display, &microphone);
        assert!(stream.has_video());
        assert!(!stream.has_audio());
    }

    #[test]
    fn kind_display() {
        assert_eq!(TrackKind::Video.to_string(), "video");
        assert_eq!(SourceKind::Microphone.to_string(), "microphone");
    }
}
