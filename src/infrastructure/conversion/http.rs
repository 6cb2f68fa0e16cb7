//! HTTP conversion service adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::application::ports::{ConversionService, UploadError};
use crate::domain::media::{ContainerFormat, MediaData};
use crate::domain::recording::Duration;
use crate::domain::upload::RECORDED_FILE_NAME;

/// Multipart field carrying the recording
const VIDEO_FIELD: &str = "video";

/// Longest server error text kept in a `Rejected` error
const MAX_ERROR_TEXT: usize = 200;

/// Client for the `POST /upload` conversion endpoint
pub struct HttpConversionClient {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpConversionClient {
    /// Create a client for the service at `endpoint` (an origin such as
    /// `https://host`). Each request is bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout.as_std())
            .build()
            .map_err(|e| UploadError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            client,
        })
    }

    /// Build the upload URL
    fn upload_url(&self) -> String {
        format!("{}/upload", self.endpoint.trim_end_matches('/'))
    }

    /// Build the multipart form
    fn build_form(payload: &MediaData) -> Result<Form, UploadError> {
        let part = Part::bytes(payload.data().to_vec())
            .file_name(RECORDED_FILE_NAME)
            .mime_str(payload.format().as_str())
            .map_err(|e| UploadError::Transport(format!("Failed to build multipart part: {}", e)))?;

        Ok(Form::new().part(VIDEO_FIELD, part))
    }

    fn transport_error(&self, error: reqwest::Error) -> UploadError {
        if error.is_timeout() {
            UploadError::Transport(format!("Request timed out after {}", self.timeout))
        } else {
            UploadError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ConversionService for HttpConversionClient {
    async fn convert(&self, payload: &MediaData) -> Result<MediaData, UploadError> {
        let url = self.upload_url();
        let form = Self::build_form(payload)?;
        debug!(url = %url, bytes = payload.size_bytes(), "sending conversion request");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            let message = match error_text.trim() {
                "" => status.canonical_reason().unwrap_or("Unknown error").to_string(),
                text => text.chars().take(MAX_ERROR_TEXT).collect(),
            };
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if body.is_empty() {
            return Err(UploadError::MalformedBody("Empty response body".to_string()));
        }

        debug!(status = %status, bytes = body.len(), "conversion response received");
        Ok(MediaData::new(body.to_vec(), ContainerFormat::Mp4))
    }
}
