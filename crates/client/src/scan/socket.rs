//! Scan socket: owns one connection to the scan gateway and keeps it alive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{AbortHandle, Abortable};
use futures_util::{Stream, StreamExt};

use super::clock::ReceiptClock;
use super::machine::{LinkMachine, ScanSignal};
use super::state::ScanState;
use super::transport::{Connector, DefaultConnector};
use crate::config::ReconnectConfig;
use crate::platform;

/// Lifecycle of a [`ScanSocket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketLifecycle {
    /// Constructed, never started
    Idle,
    /// Connecting, open, or waiting to reconnect
    Running,
    /// Stopped for good
    Terminated,
}

/// Held by the driver for every state write; `stop()` flips it under the lock.
type Gate = Arc<Mutex<bool>>;

fn lock(gate: &Gate) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Lifecycle {
    Idle,
    Running { abort: AbortHandle, gate: Gate },
    Terminated,
}

/// A self-healing connection to the scan gateway.
///
/// After [`start`](Self::start) the socket connects, publishes every valid scan
/// to its [`ScanState`], and reconnects after a fixed delay whenever the
/// connection drops, forever. [`stop`](Self::stop) (or dropping the socket)
/// ends it for good.
pub struct ScanSocket<C: Connector = DefaultConnector> {
    url: String,
    connector: Arc<C>,
    reconnect: ReconnectConfig,
    clock: ReceiptClock,
    state: ScanState,
    lifecycle: Mutex<Lifecycle>,
}

impl ScanSocket<DefaultConnector> {
    /// Socket using the platform's WebSocket implementation.
    pub fn new(url: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        Self::with_connector(url, DefaultConnector::default(), reconnect)
    }
}

impl<C: Connector> ScanSocket<C> {
    pub fn with_connector(url: impl Into<String>, connector: C, reconnect: ReconnectConfig) -> Self {
        Self {
            url: url.into(),
            connector: Arc::new(connector),
            reconnect,
            clock: ReceiptClock::default(),
            state: ScanState::new(),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    pub fn with_clock(mut self, clock: ReceiptClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read side of the socket's state.
    pub fn state(&self) -> ScanState {
        self.state.clone()
    }

    pub fn lifecycle(&self) -> SocketLifecycle {
        match *self.lock_lifecycle() {
            Lifecycle::Idle => SocketLifecycle::Idle,
            Lifecycle::Running { .. } => SocketLifecycle::Running,
            Lifecycle::Terminated => SocketLifecycle::Terminated,
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin connecting. Does nothing if already running or stopped.
    ///
    /// Returns `true` if this call started the socket.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lock_lifecycle();
        match *lifecycle {
            Lifecycle::Running { .. } => return false,
            Lifecycle::Terminated => {
                crate::log_warn!("Scan socket for {} was stopped; not restarting", self.url);
                return false;
            }
            Lifecycle::Idle => {}
        }

        let signals = LinkMachine::new(self.connector.clone(), self.url.clone(), self.reconnect.retry_delay)
            .with_clock(self.clock.clone())
            .into_signals();
        let gate: Gate = Arc::new(Mutex::new(true));
        let (abort, registration) = AbortHandle::new_pair();
        let driver = Abortable::new(drive(signals, self.state.clone(), gate.clone()), registration);

        platform::spawn(async move {
            let _ = driver.await;
        });

        crate::log_info!("Scan socket started for {}", self.url);
        *lifecycle = Lifecycle::Running { abort, gate };
        true
    }

    /// Tear down for good: cancel a pending reconnect, release the socket, and
    /// mark the state disconnected. No state changes happen after this returns.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *self.lock_lifecycle(), Lifecycle::Terminated);
        if let Lifecycle::Running { abort, gate } = previous {
            {
                let mut open = lock(&gate);
                *open = false;
                self.state.set_connected(false);
            }
            abort.abort();
            crate::log_info!("Scan socket stopped for {}", self.url);
        }
    }
}

impl<C: Connector> Drop for ScanSocket<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Feed signals into the state until aborted or the gate closes.
async fn drive(signals: impl Stream<Item = ScanSignal>, state: ScanState, gate: Gate) {
    futures_util::pin_mut!(signals);
    while let Some(signal) = signals.next().await {
        let open = lock(&gate);
        if !*open {
            break;
        }
        state.apply(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::transport::memory::MemoryConnector;
    use crate::scan::transport::TransportEvent;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;
    use tokio::time::{advance, Instant};

    const DELAY: Duration = Duration::from_millis(2000);

    static FAKE_NOW: AtomicI64 = AtomicI64::new(1_700_000_000_000);

    fn fake_now() -> i64 {
        FAKE_NOW.load(Ordering::SeqCst)
    }

    fn socket(connector: &MemoryConnector) -> ScanSocket<MemoryConnector> {
        ScanSocket::with_connector(
            "ws://gateway/ws",
            connector.clone(),
            ReconnectConfig { retry_delay: DELAY },
        )
    }

    /// Let the driver task run until it blocks again.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_until_started() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        settle().await;
        assert_eq!(socket.lifecycle(), SocketLifecycle::Idle);
        assert_eq!(connector.attempt_count(), 0);
        assert!(!socket.state().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        assert!(socket.start());
        assert!(!socket.start());
        settle().await;
        assert!(!socket.start());

        assert_eq!(connector.attempt_count(), 1);
        assert_eq!(socket.lifecycle(), SocketLifecycle::Running);
        assert!(socket.state().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn valid_scan_becomes_last_scan() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector).with_clock(ReceiptClock::new(fake_now));
        let state = socket.state();
        socket.start();
        settle().await;

        connector.send_text(0, r#"{"uid":"A1B2","reader_id":"R7"}"#);
        settle().await;

        let scan = state.last_scan().unwrap();
        assert_eq!(scan.nfc_id, "A1B2");
        assert_eq!(scan.reader_id.as_deref(), Some("R7"));
        assert_eq!(scan.timestamp, fake_now());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_frames_change_nothing() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let state = socket.state();
        socket.start();
        settle().await;

        connector.send_text(0, r#"{"uid":"FIRST"}"#);
        settle().await;
        let before = state.last_scan();
        let mut connected = state.watch_connected();
        connected.borrow_and_update();

        connector.send_text(0, r#"{"reader_id":"R7"}"#);
        connector.send_text(0, "}{ not json");
        connector.send_text(0, r#"{"uid":""}"#);
        connector.send(0, TransportEvent::Text("[1,2,3]".to_string()));
        settle().await;

        assert_eq!(state.last_scan(), before);
        assert!(state.is_connected());
        assert!(!connected.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn timestamps_never_decrease() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let state = socket.state();
        socket.start();
        settle().await;

        let mut previous = i64::MIN;
        for i in 0..5 {
            connector.send_text(0, &format!(r#"{{"uid":"TAG{i}","timestamp":1}}"#));
            settle().await;
            let scan = state.last_scan().unwrap();
            assert_eq!(scan.nfc_id, format!("TAG{i}"));
            assert!(scan.timestamp >= previous);
            assert!(scan.timestamp > 1);
            previous = scan.timestamp;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_exact_delay() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let state = socket.state();
        socket.start();
        settle().await;
        assert!(state.is_connected());

        connector.close(0);
        settle().await;
        let closed_at = Instant::now();
        assert!(!state.is_connected());
        assert_eq!(connector.attempt_count(), 1);

        advance(DELAY - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(connector.attempt_count(), 1);

        advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(connector.attempt_count(), 2);
        assert_eq!(connector.attempts()[1] - closed_at, DELAY);
        assert!(state.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn two_closes_schedule_two_reconnects() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let mut connected = socket.state().watch_connected();
        let mut seen = Vec::new();
        socket.start();
        settle().await;
        seen.push(*connected.borrow_and_update());

        for link in 0..2 {
            connector.close(link);
            settle().await;
            seen.push(*connected.borrow_and_update());
            advance(DELAY).await;
            settle().await;
            seen.push(*connected.borrow_and_update());
        }

        // Initial connect plus one reconnect per close
        assert_eq!(connector.attempt_count(), 3);
        let attempts = connector.attempts();
        assert_eq!(attempts[1] - attempts[0], DELAY);
        assert_eq!(attempts[2] - attempts[1], DELAY);
        assert_eq!(seen, vec![true, false, true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn error_forces_close_and_retry() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        socket.start();
        settle().await;

        connector.send(0, TransportEvent::Error("connection reset by peer".to_string()));
        settle().await;
        assert!(connector.is_released(0));
        assert!(!socket.state().is_connected());

        advance(DELAY).await;
        settle().await;
        assert_eq!(connector.attempt_count(), 2);
        assert!(socket.state().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_forever_while_refused() {
        let connector = MemoryConnector::new();
        connector.refuse(true);
        let socket = socket(&connector);
        socket.start();
        settle().await;

        for expected in 2..=20 {
            advance(DELAY).await;
            settle().await;
            assert_eq!(connector.attempt_count(), expected);
            assert!(!socket.state().is_connected());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_reconnect() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let state = socket.state();
        socket.start();
        settle().await;
        connector.send_text(0, r#"{"uid":"KEEP"}"#);
        settle().await;

        connector.close(0);
        settle().await;
        socket.stop();
        assert_eq!(socket.lifecycle(), SocketLifecycle::Terminated);

        advance(DELAY * 5).await;
        settle().await;
        assert_eq!(connector.attempt_count(), 1);
        assert!(!state.is_connected());
        assert_eq!(state.last_scan().unwrap().nfc_id, "KEEP");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_open_socket() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        let state = socket.state();
        socket.start();
        settle().await;
        assert!(state.is_connected());

        socket.stop();
        assert!(!state.is_connected());
        settle().await;
        assert!(connector.is_released(0));

        // Frames arriving after teardown go nowhere
        connector.send_text(0, r#"{"uid":"LATE"}"#);
        settle().await;
        assert_eq!(state.last_scan(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_socket_does_not_restart() {
        let connector = MemoryConnector::new();
        let socket = socket(&connector);
        socket.stop();
        assert!(!socket.start());
        settle().await;
        assert_eq!(connector.attempt_count(), 0);
        assert_eq!(socket.lifecycle(), SocketLifecycle::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_socket() {
        let connector = MemoryConnector::new();
        let state = {
            let socket = socket(&connector);
            socket.start();
            settle().await;
            socket.state()
        };
        assert!(!state.is_connected());

        settle().await;
        assert!(connector.is_released(0));
        advance(DELAY * 3).await;
        settle().await;
        assert_eq!(connector.attempt_count(), 1);
    }
}
