//! Meetscan Client
//!
//! Client side of the meeting scanner: the live NFC scan feed from the reader
//! gateway, and the HTTP client for the transcription/summary service.
//! Builds for native targets and for the web (WASM).

pub mod logging;

pub mod api_client;
pub mod config;
pub mod platform;
pub mod scan;

pub use api_client::{ApiClient, AudioClip};
pub use config::{ClientConfig, ReconnectConfig};
pub use scan::{ScanSession, ScanSocket, ScanState};
