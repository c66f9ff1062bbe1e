//! Native/Desktop socket transport using tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Connector, LinkStream, TransportError, TransportEvent};

/// Connects with `tokio_tungstenite::connect_async`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<LinkStream, TransportError> {
        let (ws_stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        // Pongs are queued by tungstenite and flushed on the next read.
        let events = ws_stream.filter_map(|msg_result| {
            future::ready(match msg_result {
                Ok(Message::Text(text)) => Some(TransportEvent::Text(text.to_string())),
                Ok(Message::Close(frame)) => Some(TransportEvent::Closed(
                    frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty()),
                )),
                Ok(Message::Ping(data)) => {
                    crate::log_debug!("Received ping: {:?}", data);
                    None
                }
                // Binary, pong, raw frames
                Ok(_) => None,
                Err(e) => Some(TransportEvent::Error(e.to_string())),
            })
        });

        Ok(events.boxed())
    }
}
