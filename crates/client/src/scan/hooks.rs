//! Scan hooks for Dioxus components.
//!
//! Components read `last_scan` and `connected` as signals. They never touch
//! the socket; the hook owns it and closes it when the component unmounts.

use std::rc::Rc;

use dioxus::prelude::*;
use meetscan_shared::ScanEvent;

use super::session::ScanSession;
use super::socket::ScanSocket;
use crate::config::ReconnectConfig;

/// Reactive view of one scan connection.
#[derive(Clone, Copy, PartialEq)]
pub struct NfcSocket {
    /// Latest validated scan
    pub last_scan: Signal<Option<ScanEvent>>,
    /// True while the socket is open
    pub connected: Signal<bool>,
}

/// Open a scan connection for the lifetime of the calling component.
///
/// `url` is read on the first render only.
///
/// ```rust,ignore
/// fn ScanPage() -> Element {
///     let scan = use_nfc_socket("ws://localhost:8080/ws");
///     let status = if (scan.connected)() { "connected" } else { "offline" };
///
///     rsx! {
///         p { "Reader: {status}" }
///         if let Some(event) = scan.last_scan.read().as_ref() {
///             p { "Last tag: {event.nfc_id}" }
///         }
///     }
/// }
/// ```
pub fn use_nfc_socket(url: impl Into<String>) -> NfcSocket {
    use_nfc_socket_with(url, ReconnectConfig::default())
}

pub fn use_nfc_socket_with(url: impl Into<String>, reconnect: ReconnectConfig) -> NfcSocket {
    let mut last_scan = use_signal(|| None::<ScanEvent>);
    let mut connected = use_signal(|| false);

    let session = use_hook(move || {
        let session = Rc::new(ScanSession::open(ScanSocket::new(url, reconnect)));
        let state = session.state();

        // Mirror the socket's state into signals. These tasks belong to the
        // component scope and end with it.
        let mut scans = state.watch_last_scan();
        spawn(async move {
            while scans.changed().await.is_ok() {
                let latest = scans.borrow_and_update().clone();
                last_scan.set(latest);
            }
        });

        let mut link = state.watch_connected();
        spawn(async move {
            while link.changed().await.is_ok() {
                let is_open = *link.borrow_and_update();
                connected.set(is_open);
            }
        });

        session
    });

    use_drop(move || session.close());

    NfcSocket {
        last_scan,
        connected,
    }
}

/// Like [`use_nfc_socket`], and also provide the handle to descendants.
pub fn use_provide_nfc_socket(url: impl Into<String>) -> NfcSocket {
    let socket = use_nfc_socket(url);
    use_context_provider(|| socket)
}

/// The scan connection provided by an ancestor.
pub fn use_nfc_scan() -> NfcSocket {
    use_context::<NfcSocket>()
}
