//! Request and response models for the meeting processing API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUMMARY_MAX_LENGTH: u32 = 150;
pub const DEFAULT_SUMMARY_MIN_LENGTH: u32 = 30;

// --- Health ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub models: ModelStatus,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Which server-side models are already resident.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelStatus {
    #[serde(default)]
    pub speech_to_text: bool,
    #[serde(default)]
    pub text_summarizer: bool,
}

// --- Transcription ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResponse {
    pub text: String,
    pub language: String,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

// --- Summarization ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeRequest {
    pub text: String,
    pub max_length: u32,
    pub min_length: u32,
}

impl SummarizeRequest {
    pub fn new(text: impl Into<String>, options: SummarizeOptions) -> Self {
        Self {
            text: text.into(),
            max_length: options.max_length.unwrap_or(DEFAULT_SUMMARY_MAX_LENGTH),
            min_length: options.min_length.unwrap_or(DEFAULT_SUMMARY_MIN_LENGTH),
        }
    }
}

/// Optional summary length bounds, in words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummarizeOptions {
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
}

impl SummarizeOptions {
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_min_length(mut self, min_length: u32) -> Self {
        self.min_length = Some(min_length);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeResponse {
    pub summary: String,
    pub original_length: u32,
    pub summary_length: u32,
}

// --- Meeting pipeline ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessMeetingResponse {
    pub meeting_id: String,
    #[serde(default)]
    pub transcription: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub language: Option<String>,
    /// ISO-8601 server-local time, no offset
    pub processed_at: String,
}

impl ProcessMeetingResponse {
    /// Parse `processed_at`. Returns `None` if the server sent something else.
    pub fn processed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.processed_at, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

// --- Preload ---

/// Acknowledgement only; models load after the response is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreloadResponse {
    pub message: String,
}
