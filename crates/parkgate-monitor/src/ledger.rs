//! Bounded, newest-first history of processed events.
//!
//! The ledger keeps at most `capacity` events. Recording a new event puts it
//! at the front; once the ledger is full the oldest event falls off the
//! back. Denials are recorded like any other event.
//!
//! ```
//! use parkgate_monitor::ledger::HistoryLedger;
//! # use parkgate_protocol::RecordParser;
//!
//! let mut ledger = HistoryLedger::new(2);
//! for places in [9, 8, 7] {
//!     let line = format!("Entry|93064AFC|Jane Doe|N/A|N/A|{places}");
//!     ledger.record(RecordParser::parse(&line).unwrap());
//! }
//!
//! let snapshot = ledger.snapshot();
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(snapshot[0].available_places, 7);
//! assert_eq!(snapshot[1].available_places, 8);
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use parkgate_core::ParkingEvent;
use parkgate_core::constants::DEFAULT_HISTORY_CAPACITY;

/// Ring of recent events, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLedger {
    entries: VecDeque<ParkingEvent>,
    capacity: usize,
}

impl HistoryLedger {
    /// Create an empty ledger holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an event at the front, evicting from the back past capacity.
    pub fn record(&mut self, event: ParkingEvent) {
        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
    }

    /// Copy of the current contents, newest first.
    pub fn snapshot(&self) -> Vec<ParkingEvent> {
        self.entries.iter().cloned().collect()
    }

    /// Display rows for the current contents, newest first.
    pub fn rows(&self) -> Vec<HistoryRow> {
        self.entries.iter().map(HistoryRow::from).collect()
    }

    /// Most recently recorded event.
    pub fn latest(&self) -> Option<&ParkingEvent> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParkingEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// One history row as shown to operators.
///
/// Column order: time, action, credential, person, entry, exit, places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub time: String,
    pub action: String,
    pub credential_id: String,
    pub person: String,
    pub entry_time: String,
    pub exit_time: String,
    pub available_places: u32,
}

impl HistoryRow {
    /// Column headers matching the [`fmt::Display`] layout.
    pub const HEADERS: [&'static str; 7] = [
        "Time",
        "Action",
        "Card UID",
        "Person",
        "Entry Time",
        "Exit Time",
        "Places",
    ];

    /// Header line aligned with the rows.
    pub fn header() -> String {
        let [time, action, card, person, entry, exit, places] = Self::HEADERS;
        format!(
            "{time:<19}  {action:<13}  {card:<20}  {person:<20}  {entry:<19}  {exit:<19}  {places:>6}"
        )
    }
}

impl From<&ParkingEvent> for HistoryRow {
    fn from(event: &ParkingEvent) -> Self {
        Self {
            time: event.observed_at_display(),
            action: event.action.to_string(),
            credential_id: event.credential_id.to_string(),
            person: event.person.clone(),
            entry_time: event.entry_time.clone(),
            exit_time: event.exit_time.clone(),
            available_places: event.available_places,
        }
    }
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<19}  {:<13}  {:<20}  {:<20}  {:<19}  {:<19}  {:>6}",
            self.time,
            self.action,
            self.credential_id,
            self.person,
            self.entry_time,
            self.exit_time,
            self.available_places
        )
    }
}
