//! Notifications from the monitor to its consumers.
//!
//! Signals travel over an unbounded tokio mpsc channel so the ingestion
//! thread never blocks on a slow consumer. A dropped receiver is tolerated:
//! ingestion keeps updating state and the signal is discarded.

use tokio::sync::mpsc;
use tracing::trace;

use parkgate_core::{ConnectionError, CredentialId, ParkingEvent, ProtocolError};

/// Something a consumer should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorSignal {
    /// An event was accepted and recorded (granted or denied).
    Event(ParkingEvent),

    /// A credential outside the allow-list was presented. Always follows the
    /// corresponding `Event`.
    AccessDenied { credential_id: CredentialId },

    /// A line was rejected; nothing was recorded.
    ProtocolError {
        error: ProtocolError,
        raw_line: String,
    },

    /// The serial link failed to open or was lost.
    ConnectionError(ConnectionError),
}

pub type SignalReceiver = mpsc::UnboundedReceiver<MonitorSignal>;

/// Sending half of the signal channel.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<MonitorSignal>,
}

impl SignalSender {
    /// Deliver a signal, ignoring a closed receiver.
    pub fn send(&self, signal: MonitorSignal) {
        if self.tx.send(signal).is_err() {
            trace!("Signal receiver dropped, discarding signal");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected sender/receiver pair.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender { tx }, rx)
}
