//! Ingestion engine.
//!
//! [`Monitor`] is the single writer of gate state. Each decoded line goes
//! through the same steps, in order:
//!
//! 1. A rejected line is logged and signalled. Nothing else happens.
//! 2. An event is evaluated against the allow-list (denials are rewritten).
//! 3. The resulting event is applied to [`SessionState`].
//! 4. The event is recorded in the [`HistoryLedger`].
//! 5. `Event` is signalled, followed by `AccessDenied` for denials.
//!
//! Steps 3 and 4 happen under one write lock, so a [`MonitorView`] never
//! observes a session that disagrees with the newest ledger entry.
//!
//! # Examples
//!
//! ```
//! use parkgate_core::MonitorConfig;
//! use parkgate_monitor::{Monitor, MonitorSignal};
//! use parkgate_protocol::decode_line;
//!
//! let config = MonitorConfig {
//!     allow_list: vec!["93064AFC".to_string()],
//!     ..MonitorConfig::default()
//! };
//! let (monitor, mut signals) = Monitor::new(&config);
//! let view = monitor.view();
//!
//! let line = decode_line(b"Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9");
//! monitor.ingest(line);
//!
//! assert_eq!(view.session().available_places(), 9);
//! assert!(matches!(signals.try_recv(), Ok(MonitorSignal::Event(_))));
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use parkgate_core::{ConnectionError, MonitorConfig, ParkingEvent};
use parkgate_protocol::{LineResult, RejectedLine};

use crate::access::{AccessEvaluator, AllowList};
use crate::ledger::{HistoryLedger, HistoryRow};
use crate::session::SessionState;
use crate::signal::{MonitorSignal, SignalReceiver, SignalSender, signal_channel};

#[derive(Debug)]
struct MonitorState {
    session: SessionState,
    ledger: HistoryLedger,
}

type SharedState = Arc<RwLock<MonitorState>>;

/// Poisoning only means a panic happened elsewhere while the lock was
/// held; session and ledger updates leave no torn invariants, so the data
/// stays usable.
fn read_state(shared: &SharedState) -> RwLockReadGuard<'_, MonitorState> {
    shared.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(shared: &SharedState) -> RwLockWriteGuard<'_, MonitorState> {
    shared.write().unwrap_or_else(PoisonError::into_inner)
}

/// Single writer of session state and history.
///
/// Clones share state and the signal channel. Only one clone should ingest
/// at a time; the connection supervisor guarantees this by running at most
/// one reader.
#[derive(Debug, Clone)]
pub struct Monitor {
    evaluator: AccessEvaluator,
    shared: SharedState,
    signals: SignalSender,
    starting_places: u32,
}

impl Monitor {
    /// Build a monitor from configuration, returning it with the receiving
    /// end of its signal channel.
    pub fn new(config: &MonitorConfig) -> (Self, SignalReceiver) {
        let (signals, receiver) = signal_channel();
        let allow_list = config
            .allow_list
            .iter()
            .map(String::as_str)
            .collect::<AllowList>();
        let monitor = Self::with_parts(
            allow_list,
            config.starting_places,
            config.history_capacity,
            signals,
        );
        (monitor, receiver)
    }

    /// Build a monitor from its components.
    pub fn with_parts(
        allow_list: AllowList,
        starting_places: u32,
        history_capacity: usize,
        signals: SignalSender,
    ) -> Self {
        info!(
            authorized = allow_list.len(),
            starting_places, history_capacity, "Monitor initialized"
        );
        Self {
            evaluator: AccessEvaluator::new(allow_list),
            shared: Arc::new(RwLock::new(MonitorState {
                session: SessionState::new(starting_places),
                ledger: HistoryLedger::new(history_capacity),
            })),
            signals,
            starting_places,
        }
    }

    /// Read-only handle for presentation code.
    pub fn view(&self) -> MonitorView {
        MonitorView {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn signals(&self) -> &SignalSender {
        &self.signals
    }

    pub fn allow_list(&self) -> &AllowList {
        self.evaluator.allow_list()
    }

    /// Process one decoded line.
    ///
    /// Returns the recorded event, or `None` if the line was rejected.
    pub fn ingest(&self, line: LineResult) -> Option<ParkingEvent> {
        match line {
            Ok(event) => Some(self.process(event)),
            Err(rejected) => {
                self.reject(rejected);
                None
            }
        }
    }

    /// Evaluate, apply and record a parsed event. Returns the event as
    /// recorded, which differs from the input for denials.
    pub fn process(&self, event: ParkingEvent) -> ParkingEvent {
        let outcome = self.evaluator.evaluate(event);
        let denied = outcome.is_denied();
        let event = outcome.into_event();

        {
            let mut state = write_state(&self.shared);
            state.session.apply(&event);
            state.ledger.record(event.clone());
        }

        debug!(
            action = %event.action,
            credential_id = %event.credential_id,
            available_places = event.available_places,
            "Event recorded"
        );

        self.signals.send(MonitorSignal::Event(event.clone()));
        if denied {
            self.signals.send(MonitorSignal::AccessDenied {
                credential_id: event.credential_id.clone(),
            });
        }

        event
    }

    /// Report a rejected line without touching state.
    pub fn reject(&self, rejected: RejectedLine) {
        warn!(
            error = %rejected.error,
            raw_line = %rejected.raw_line,
            "Discarding status line"
        );
        self.signals.send(MonitorSignal::ProtocolError {
            error: rejected.error,
            raw_line: rejected.raw_line,
        });
    }

    /// Report a failure of the serial link. State is kept.
    pub fn report_connection_error(&self, error: ConnectionError) {
        warn!(port = %error.port(), %error, "Serial link error");
        self.signals.send(MonitorSignal::ConnectionError(error));
    }

    /// Return session state and history to their initial values.
    pub fn reset(&self) {
        let mut state = write_state(&self.shared);
        state.session = SessionState::new(self.starting_places);
        state.ledger.clear();
        info!(starting_places = self.starting_places, "Monitor state reset");
    }
}

/// Read-only, cloneable handle onto monitor state.
///
/// Every accessor copies data out under a short read lock.
#[derive(Debug, Clone)]
pub struct MonitorView {
    shared: SharedState,
}

impl MonitorView {
    pub fn session(&self) -> SessionState {
        read_state(&self.shared).session.clone()
    }

    /// History snapshot, newest first.
    pub fn history(&self) -> Vec<ParkingEvent> {
        read_state(&self.shared).ledger.snapshot()
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        read_state(&self.shared).ledger.rows()
    }

    pub fn history_len(&self) -> usize {
        read_state(&self.shared).ledger.len()
    }

    pub fn latest(&self) -> Option<ParkingEvent> {
        read_state(&self.shared).ledger.latest().cloned()
    }
}
