//! The scan connection state machine.
//!
//! ```text
//!            ┌────────────┐  handshake ok   ┌──────┐
//!  start ──▶ │ CONNECTING │ ──────────────▶ │ OPEN │ ── text frame ──▶ decode
//!            └────────────┘                 └──────┘
//!               ▲     │ handshake failed        │ close / error
//!               │     ▼                         ▼
//!               │  ┌──────────────────────────────┐
//!               └──│ RETRY PENDING (fixed delay)  │
//!                  └──────────────────────────────┘
//! ```
//!
//! The machine never terminates on its own. Teardown is done by dropping it,
//! which also drops the open link or the pending timer.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, Stream, StreamExt};
use meetscan_shared::{decode_scan, ScanEvent};

use super::clock::ReceiptClock;
use super::transport::{Connector, LinkStream, TransportEvent};
use crate::platform;

/// What the connection reports to the state surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSignal {
    Connected,
    Disconnected,
    ScanReceived(ScanEvent),
}

enum Phase {
    Connecting,
    Open(LinkStream),
    RetryPending,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Connecting => "connecting",
            Phase::Open(_) => "open",
            Phase::RetryPending => "retry-pending",
        }
    }
}

pub struct LinkMachine<C> {
    connector: Arc<C>,
    url: String,
    retry_delay: Duration,
    clock: ReceiptClock,
    phase: Phase,
    attempt: u64,
}

impl<C: Connector> LinkMachine<C> {
    pub fn new(connector: Arc<C>, url: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            connector,
            url: url.into(),
            retry_delay,
            clock: ReceiptClock::default(),
            phase: Phase::Connecting,
            attempt: 0,
        }
    }

    pub fn with_clock(mut self, clock: ReceiptClock) -> Self {
        self.clock = clock;
        self
    }

    /// Run until the next externally visible signal.
    ///
    /// Rejected frames and failed handshakes are logged and absorbed here.
    pub async fn next_signal(&mut self) -> ScanSignal {
        loop {
            // Left as RetryPending only if dropped mid-await.
            match std::mem::replace(&mut self.phase, Phase::RetryPending) {
                Phase::Connecting => {
                    self.attempt += 1;
                    crate::log_debug!("Scan socket connecting to {} (attempt {})", self.url, self.attempt);
                    match self.connector.connect(&self.url).await {
                        Ok(link) => {
                            crate::log_info!("Scan socket connected to {}", self.url);
                            self.phase = Phase::Open(link);
                            return ScanSignal::Connected;
                        }
                        Err(e) => {
                            crate::log_error!("Scan socket error: {}", e);
                            self.phase = Phase::RetryPending;
                        }
                    }
                }
                Phase::Open(mut link) => {
                    let event = link.next().await;
                    match event {
                        Some(TransportEvent::Text(text)) => {
                            self.phase = Phase::Open(link);
                            crate::log_debug!("Scan socket received: {}", text);
                            match decode_scan(&text, self.clock.now()) {
                                Ok(event) => {
                                    crate::log_info!(
                                        "Scan received: {} (reader {:?})",
                                        event.nfc_id,
                                        event.reader_id
                                    );
                                    return ScanSignal::ScanReceived(event);
                                }
                                Err(e) => crate::log_warn!("Discarding scan frame: {}", e),
                            }
                        }
                        Some(TransportEvent::Error(reason)) => {
                            crate::log_error!("Scan socket error: {}", reason);
                            // Dropping the link forces the socket closed.
                            drop(link);
                            return self.closed();
                        }
                        Some(TransportEvent::Closed(reason)) => {
                            crate::log_info!(
                                "Scan socket closed ({}), reconnect in {}ms",
                                reason.as_deref().unwrap_or("no reason"),
                                self.retry_delay.as_millis()
                            );
                            return self.closed();
                        }
                        None => {
                            crate::log_info!(
                                "Scan socket stream ended, reconnect in {}ms",
                                self.retry_delay.as_millis()
                            );
                            return self.closed();
                        }
                    }
                }
                Phase::RetryPending => {
                    platform::sleep(self.retry_delay).await;
                    self.phase = Phase::Connecting;
                }
            }
        }
    }

    fn closed(&mut self) -> ScanSignal {
        self.phase = Phase::RetryPending;
        ScanSignal::Disconnected
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    /// Turn the machine into an endless stream of signals.
    ///
    /// Nothing happens until the stream is first polled. The stream cannot be
    /// restarted; build a new machine instead.
    pub fn into_signals(self) -> impl Stream<Item = ScanSignal> {
        stream::unfold(self, |mut machine| async move {
            let signal = machine.next_signal().await;
            Some((signal, machine))
        })
    }
}
