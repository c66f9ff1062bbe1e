//! Scan gateway wire format and the scan event decoder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Frame pushed by the scan gateway for every tag read.
///
/// `{ "uid": "<tag id>", "reader_id": "<reader id, optional>" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanFrame {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_id: Option<String>,
}

impl ScanFrame {
    pub fn new(uid: impl Into<String>, reader_id: Option<&str>) -> Self {
        Self {
            uid: uid.into(),
            reader_id: reader_id.map(str::to_string),
        }
    }
}

/// One validated tag read.
///
/// Immutable once decoded. A newer event replaces it entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanEvent {
    /// Identifier of the scanned tag
    pub nfc_id: String,
    /// Reader that produced the read, if the gateway reported one
    pub reader_id: Option<String>,
    /// Receipt time in milliseconds since the Unix epoch (client clock)
    pub timestamp: i64,
}

/// Why an inbound frame was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("scan frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("scan frame has no uid")]
    MissingUid,
}

/// Decode a raw text frame into a [`ScanEvent`].
///
/// `received_at` becomes the event timestamp; any timestamp carried on the
/// wire is ignored. Empty or non-string `reader_id` values are dropped.
pub fn decode_scan(text: &str, received_at: i64) -> Result<ScanEvent, DecodeError> {
    let value: Value = serde_json::from_str(text)?;

    let nfc_id = non_empty_str(&value, "uid").ok_or(DecodeError::MissingUid)?;
    let reader_id = non_empty_str(&value, "reader_id");

    Ok(ScanEvent {
        nfc_id,
        reader_id,
        timestamp: received_at,
    })
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
