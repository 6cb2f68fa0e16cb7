//! Media domain module

mod media_data;
mod track;

pub use media_data::{human_readable_size, ContainerFormat, MediaData};
pub use track::{CombinedStream, InputSpec, MediaSource, MediaTrack, SourceKind, TrackKind};
