//! In-memory connector for driving the scan socket from tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_channel::mpsc::{unbounded, UnboundedSender};
use futures_util::StreamExt;
use tokio::time::Instant;

use super::{Connector, LinkStream, TransportError, TransportEvent};

#[derive(Default)]
struct Gateway {
    refuse: bool,
    attempts: Vec<Instant>,
    links: Vec<UnboundedSender<TransportEvent>>,
}

/// Every `connect` is recorded; accepted links can be fed and closed by index.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    gateway: Arc<Mutex<Gateway>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject handshakes until set back to `false`.
    pub fn refuse(&self, refuse: bool) {
        self.gateway.lock().unwrap().refuse = refuse;
    }

    /// Clock readings of every connect attempt, accepted or refused.
    pub fn attempts(&self) -> Vec<Instant> {
        self.gateway.lock().unwrap().attempts.clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.gateway.lock().unwrap().attempts.len()
    }

    pub fn link_count(&self) -> usize {
        self.gateway.lock().unwrap().links.len()
    }

    pub fn send(&self, link: usize, event: TransportEvent) {
        let gateway = self.gateway.lock().unwrap();
        let _ = gateway.links[link].unbounded_send(event);
    }

    pub fn send_text(&self, link: usize, text: &str) {
        self.send(link, TransportEvent::Text(text.to_string()));
    }

    /// Peer-initiated close.
    pub fn close(&self, link: usize) {
        self.send(link, TransportEvent::Closed(None));
    }

    /// True once the client side has dropped the link.
    pub fn is_released(&self, link: usize) -> bool {
        self.gateway.lock().unwrap().links[link].is_closed()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<LinkStream, TransportError> {
        let mut gateway = self.gateway.lock().unwrap();
        gateway.attempts.push(Instant::now());
        if gateway.refuse {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let (tx, rx) = unbounded();
        gateway.links.push(tx);
        Ok(rx.boxed())
    }
}
