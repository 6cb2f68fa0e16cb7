//! Upload domain module

mod status;

pub use status::{
    StatusKind, StatusMessage, UploadInFlight, UploadState, UploadStatus, FAILURE_MESSAGE,
    SUCCESS_MESSAGE,
};

/// File name the converted artifact is saved under
pub const CONVERTED_FILE_NAME: &str = "converted-video.mp4";

/// File name of the recorded payload inside the multipart form
pub const RECORDED_FILE_NAME: &str = "recorded-video.webm";

/// File name used when saving the raw recording without conversion
pub const RAW_RECORDING_FILE_NAME: &str = "screen-recording.webm";
