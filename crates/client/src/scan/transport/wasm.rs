//! WASM/Web socket transport using web_sys::WebSocket.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{Stream, StreamExt};
use wasm_bindgen::prelude::*;
use web_sys::{js_sys, CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use super::{Connector, LinkStream, TransportError, TransportEvent};

/// Connects with the browser's `WebSocket`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSysConnector;

/// Raw callback output before the handshake is known to have succeeded.
enum SocketEvent {
    Open,
    Frame(TransportEvent),
}

#[async_trait(?Send)]
impl Connector for WebSysConnector {
    async fn connect(&self, url: &str) -> Result<LinkStream, TransportError> {
        let connect_err = |reason: String| TransportError::Connect {
            url: url.to_string(),
            reason,
        };

        let socket =
            WebSocket::new(url).map_err(|e| connect_err(format!("{:?}", e)))?;
        let (tx, events) = unbounded();
        let callbacks = Callbacks::attach(&socket, tx);

        let mut link = WebSysLink {
            socket,
            events,
            _callbacks: callbacks,
        };

        // The first event decides the handshake; anything but `Open` drops
        // the link, which closes the socket.
        match link.events.next().await {
            Some(SocketEvent::Open) => Ok(link.boxed_local()),
            Some(SocketEvent::Frame(TransportEvent::Error(reason)))
            | Some(SocketEvent::Frame(TransportEvent::Closed(Some(reason)))) => {
                Err(connect_err(reason))
            }
            _ => Err(connect_err("socket closed during handshake".to_string())),
        }
    }
}

/// Keeps the JS closures alive for as long as the socket is in use.
struct Callbacks {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(ErrorEvent)>,
}

impl Callbacks {
    fn attach(socket: &WebSocket, tx: UnboundedSender<SocketEvent>) -> Self {
        let open_tx = tx.clone();
        let on_open = Closure::wrap(Box::new(move |_: Event| {
            crate::log_debug!("WebSocket onopen fired");
            let _ = open_tx.unbounded_send(SocketEvent::Open);
        }) as Box<dyn FnMut(Event)>);
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let message_tx = tx.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            // Text frames only
            if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                let _ = message_tx.unbounded_send(SocketEvent::Frame(TransportEvent::Text(text)));
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let close_tx = tx.clone();
        let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
            let reason = if e.reason().is_empty() {
                format!("Code {}", e.code())
            } else {
                e.reason()
            };
            let _ = close_tx.unbounded_send(SocketEvent::Frame(TransportEvent::Closed(Some(reason))));
        }) as Box<dyn FnMut(CloseEvent)>);
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let on_error = Closure::wrap(Box::new(move |e: ErrorEvent| {
            let message = e.message();
            let reason = if message.is_empty() {
                "WebSocket error".to_string()
            } else {
                message
            };
            let _ = tx.unbounded_send(SocketEvent::Frame(TransportEvent::Error(reason)));
        }) as Box<dyn FnMut(ErrorEvent)>);
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self {
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        }
    }
}

/// An open browser socket. Closes the socket when dropped.
struct WebSysLink {
    socket: WebSocket,
    events: UnboundedReceiver<SocketEvent>,
    _callbacks: Callbacks,
}

impl Stream for WebSysLink {
    type Item = TransportEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.events.poll_next_unpin(cx) {
                Poll::Ready(Some(SocketEvent::Frame(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(SocketEvent::Open)) => continue,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for WebSysLink {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        self.socket.set_onerror(None);
        // readyState 0 = CONNECTING, 1 = OPEN
        if self.socket.ready_state() <= WebSocket::OPEN {
            let _ = self.socket.close();
        }
    }
}
