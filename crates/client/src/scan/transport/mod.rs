//! Socket transport behind the scan connection.
//!
//! A [`Connector`] performs the handshake and hands back a [`LinkStream`] of
//! [`TransportEvent`]s. Dropping the stream closes the socket.

use async_trait::async_trait;
use thiserror::Error;

use crate::platform::MaybeSend;

/// Something the open socket reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame
    Text(String),
    /// The socket closed, with the peer's reason if it sent one
    Closed(Option<String>),
    /// The socket failed; the link must be dropped
    Error(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

/// Events from one open socket. Ends (or yields `Closed`) when the socket goes away.
#[cfg(not(target_arch = "wasm32"))]
pub type LinkStream = futures_util::stream::BoxStream<'static, TransportEvent>;
#[cfg(target_arch = "wasm32")]
pub type LinkStream = futures_util::stream::LocalBoxStream<'static, TransportEvent>;

/// Opens sockets to the scan gateway.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Connector: MaybeSend + 'static {
    /// Complete the handshake. An error here is a failed `CONNECTING` attempt.
    async fn connect(&self, url: &str) -> Result<LinkStream, TransportError>;
}

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(not(target_arch = "wasm32"))]
pub use native::{TungsteniteConnector, TungsteniteConnector as DefaultConnector};

#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(target_arch = "wasm32")]
pub use wasm::{WebSysConnector, WebSysConnector as DefaultConnector};

#[cfg(test)]
pub(crate) mod memory;
