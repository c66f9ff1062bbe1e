//! HTTP client for the meeting processing API.
//!
//! Independent of the scan socket. Transcription and summarization run
//! server-side and can take minutes, hence the long default timeout.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{select, Either};
use meetscan_shared::{
    ApiError, HealthResponse, PreloadResponse, ProcessMeetingResponse, SummarizeOptions,
    SummarizeRequest, SummarizeResponse, TranscriptionResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_API_TIMEOUT_SECS};
use crate::platform;

/// A recorded audio clip to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    /// WebM audio, the format browsers record in.
    pub fn webm(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            mime_type: "audio/webm".to_string(),
        }
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.data)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|e| ApiError::Network(format!("invalid mime type: {e}")))?;
        Ok(Form::new().part("file", part))
    }
}

/// Client for the processing API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new()
            .with_base_url(config.api_base.clone())
            .with_timeout(config.api_timeout)
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    // --- Endpoints ---

    /// Check that the backend is up and which models are loaded.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.send(self.client.get(self.url("/health"))).await
    }

    /// Transcribe an audio clip. Plain bytes are uploaded as `recording.webm`.
    pub async fn transcribe(
        &self,
        audio: impl Into<AudioOrBytes>,
    ) -> Result<TranscriptionResponse, ApiError> {
        let clip = audio.into().into_clip("recording.webm");
        self.post_multipart("/transcribe", clip).await
    }

    /// Summarize text. Unset bounds default to 150/30 words.
    pub async fn summarize(
        &self,
        text: impl Into<String>,
        options: SummarizeOptions,
    ) -> Result<SummarizeResponse, ApiError> {
        self.post_json("/summarize", &SummarizeRequest::new(text, options))
            .await
    }

    /// Transcribe and summarize a meeting recording in one call.
    /// Plain bytes are uploaded as `meeting-recording.webm`.
    pub async fn process_meeting(
        &self,
        audio: impl Into<AudioOrBytes>,
    ) -> Result<ProcessMeetingResponse, ApiError> {
        let clip = audio.into().into_clip("meeting-recording.webm");
        self.post_multipart("/process-meeting", clip).await
    }

    /// Ask the server to load its models in the background.
    /// The response only acknowledges the request.
    pub async fn preload_models(&self) -> Result<PreloadResponse, ApiError> {
        self.send(self.client.post(self.url("/preload-models")))
            .await
    }

    // --- Transport helpers ---

    async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let body_bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::Deserialize(e.to_string()))?;
        let rb = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body_bytes);
        self.send(rb).await
    }

    async fn post_multipart<TRes: DeserializeOwned>(
        &self,
        path: &str,
        clip: AudioClip,
    ) -> Result<TRes, ApiError> {
        let form = clip.into_form()?;
        self.send(self.client.post(self.url(path)).multipart(form))
            .await
    }

    async fn send<TRes: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<TRes, ApiError> {
        let (status, text) = within(self.timeout, exchange(rb)).await?;

        if !status.is_success() {
            crate::log_warn!("API request failed with HTTP {}", status.as_u16());
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }
}

async fn exchange(rb: RequestBuilder) -> Result<(StatusCode, String), ApiError> {
    let resp = rb.send().await.map_err(network_error)?;
    let status = resp.status();
    let text = resp.text().await.map_err(network_error)?;
    Ok((status, text))
}

/// Fail with [`ApiError::Timeout`] if `request` has not finished within `limit`.
///
/// Covers the whole exchange, body included, on either target's timer.
async fn within<T>(
    limit: Duration,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    let request = pin!(request);
    let deadline = pin!(platform::sleep(limit));
    match select(request, deadline).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ApiError::Timeout),
    }
}

fn network_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Either a prepared [`AudioClip`] or raw recorded bytes.
pub enum AudioOrBytes {
    Clip(AudioClip),
    Bytes(Vec<u8>),
}

impl AudioOrBytes {
    fn into_clip(self, default_name: &str) -> AudioClip {
        match self {
            AudioOrBytes::Clip(clip) => clip,
            AudioOrBytes::Bytes(data) => AudioClip::webm(data, default_name),
        }
    }
}

impl From<AudioClip> for AudioOrBytes {
    fn from(clip: AudioClip) -> Self {
        AudioOrBytes::Clip(clip)
    }
}

impl From<Vec<u8>> for AudioOrBytes {
    fn from(data: Vec<u8>) -> Self {
        AudioOrBytes::Bytes(data)
    }
}
