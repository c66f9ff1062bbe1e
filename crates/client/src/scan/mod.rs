//! Real-time scan ingestion from the NFC reader gateway.
//!
//! This module provides:
//! - A self-healing socket to the scan gateway (fixed-delay reconnect, forever)
//! - Validation of inbound scan frames
//! - Observable `last_scan` / `connected` state
//! - Lifecycle binding to views (Dioxus hook) or any owner (RAII session)
//!
//! # Architecture
//!
//! ```text
//!   reader ──▶ gateway ──▶ ┌──────────────────────┐
//!                          │ Connector (platform) │  tungstenite / web_sys
//!                          └──────────────────────┘
//!                                     │ TransportEvent
//!                                     ▼
//!                          ┌──────────────────────┐
//!                          │     LinkMachine      │  connect / decode / retry
//!                          └──────────────────────┘
//!                                     │ ScanSignal
//!                                     ▼
//!                          ┌──────────────────────┐
//!                          │      ScanState       │  last_scan, connected
//!                          └──────────────────────┘
//!                                     │ watch
//!                      ┌──────────────┴──────────────┐
//!                      ▼                             ▼
//!              use_nfc_socket()               scan-monitor
//!              (signals in views)             (logs scans)
//! ```
//!
//! `ScanSocket` owns the machine and the driver task; `ScanSession` starts and
//! stops it with its owner.

mod clock;
mod hooks;
mod machine;
mod session;
mod socket;
mod state;
pub mod transport;

pub use clock::{wall_clock_millis, ReceiptClock};
pub use hooks::{
    use_nfc_scan, use_nfc_socket, use_nfc_socket_with, use_provide_nfc_socket, NfcSocket,
};
pub use machine::{LinkMachine, ScanSignal};
pub use session::ScanSession;
pub use socket::{ScanSocket, SocketLifecycle};
pub use state::ScanState;
pub use transport::{Connector, DefaultConnector, LinkStream, TransportError, TransportEvent};
