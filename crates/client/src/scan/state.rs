//! Observable scan state: the latest scan and the connectivity flag.
//!
//! Last write wins. Nothing is queued; a reader that falls behind only ever
//! sees the newest value.

use std::sync::Arc;

use meetscan_shared::ScanEvent;
use tokio::sync::watch;

use super::machine::ScanSignal;

#[derive(Debug)]
struct Inner {
    last_scan: watch::Sender<Option<ScanEvent>>,
    connected: watch::Sender<bool>,
}

/// Cheap to clone; every clone shares the same state.
///
/// Only the scan socket writes to it. Everyone else reads or watches.
#[derive(Debug, Clone)]
pub struct ScanState {
    inner: Arc<Inner>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState {
    pub fn new() -> Self {
        let (last_scan, _) = watch::channel(None);
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                last_scan,
                connected,
            }),
        }
    }

    /// The most recent validated scan, if any.
    pub fn last_scan(&self) -> Option<ScanEvent> {
        self.inner.last_scan.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    /// Receiver that wakes on every new scan.
    pub fn watch_last_scan(&self) -> watch::Receiver<Option<ScanEvent>> {
        self.inner.last_scan.subscribe()
    }

    /// Receiver that wakes whenever the connectivity flag flips.
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }

    pub(crate) fn apply(&self, signal: ScanSignal) {
        match signal {
            ScanSignal::Connected => self.set_connected(true),
            ScanSignal::Disconnected => self.set_connected(false),
            ScanSignal::ScanReceived(event) => {
                self.inner.last_scan.send_replace(Some(event));
            }
        }
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.inner.connected.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
    }
}
