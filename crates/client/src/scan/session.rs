//! Binds a scan socket to the lifetime of whoever owns the session.

use super::socket::{ScanSocket, SocketLifecycle};
use super::state::ScanState;
use super::transport::{Connector, DefaultConnector};

/// Starts its socket when opened and stops it when closed or dropped.
///
/// Own exactly one session per view (or per process, for the monitor binary).
/// A session cannot be reopened; open a new one.
pub struct ScanSession<C: Connector = DefaultConnector> {
    socket: ScanSocket<C>,
}

impl<C: Connector> ScanSession<C> {
    /// Activate: start the socket.
    pub fn open(socket: ScanSocket<C>) -> Self {
        socket.start();
        Self { socket }
    }

    pub fn state(&self) -> ScanState {
        self.socket.state()
    }

    pub fn is_active(&self) -> bool {
        self.socket.lifecycle() == SocketLifecycle::Running
    }

    /// Deactivate: stop the socket. Safe to call more than once.
    pub fn close(&self) {
        self.socket.stop();
    }
}

impl<C: Connector> Drop for ScanSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}
