//! Access decisions, session state and history for the parking gate.
//!
//! Decoded status lines from [`parkgate_protocol`] enter through
//! [`Monitor::ingest`]. The monitor checks credentials against the
//! allow-list, keeps the current occupancy view and a bounded history, and
//! emits [`MonitorSignal`]s for consumers.

pub mod access;
pub mod engine;
pub mod ledger;
pub mod session;
pub mod signal;

pub use access::{AccessEvaluator, AccessOutcome, AllowList, evaluate};
pub use engine::{Monitor, MonitorView};
pub use ledger::{HistoryLedger, HistoryRow};
pub use session::SessionState;
pub use signal::{MonitorSignal, SignalReceiver, SignalSender, signal_channel};
