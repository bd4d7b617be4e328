use crate::constants::{
    ACTION_ACCESS_DENIED, ACTION_ENTRY, ACTION_EXIT, DELIMITER_FIELD, OBSERVED_AT_FORMAT,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Credential identifier presented at the reader (typically a hex card UID).
///
/// Surrounding whitespace is trimmed; otherwise the value is kept exactly
/// as the terminal sent it, so `"93064afc"` and `"93064AFC"` are distinct.
///
/// # Security
/// Equality is constant-time so allow-list lookups do not leak how much of
/// a presented UID matched an authorized one.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(String);

impl CredentialId {
    /// Create a credential identifier, trimming surrounding whitespace.
    pub fn new(id: impl AsRef<str>) -> Self {
        CredentialId(id.as_ref().trim().to_string())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CredentialId {
    fn from(s: &str) -> Self {
        CredentialId::new(s)
    }
}

impl From<String> for CredentialId {
    fn from(s: String) -> Self {
        CredentialId::new(s)
    }
}

impl PartialEq for CredentialId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CredentialId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Action label of a parking event.
///
/// The terminal's label set is open: `Entry` and `Exit` are recognized and
/// anything else is carried verbatim in [`EventAction::Other`].
/// [`EventAction::AccessDenied`] is only ever produced by the access
/// evaluator; [`EventAction::from_wire`] never returns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventAction {
    Entry,
    Exit,
    AccessDenied,
    Other(String),
}

impl EventAction {
    /// Map a label received from the terminal.
    ///
    /// ```
    /// use parkgate_core::EventAction;
    ///
    /// assert_eq!(EventAction::from_wire("Entry"), EventAction::Entry);
    /// assert_eq!(
    ///     EventAction::from_wire("Access Denied"),
    ///     EventAction::Other("Access Denied".to_string())
    /// );
    /// ```
    pub fn from_wire(label: &str) -> Self {
        match label {
            ACTION_ENTRY => EventAction::Entry,
            ACTION_EXIT => EventAction::Exit,
            other => EventAction::Other(other.to_string()),
        }
    }

    /// Label as shown to operators and written on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            EventAction::Entry => ACTION_ENTRY,
            EventAction::Exit => ACTION_EXIT,
            EventAction::AccessDenied => ACTION_ACCESS_DENIED,
            EventAction::Other(label) => label,
        }
    }

    /// Returns `true` for the evaluator's denial sentinel.
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, EventAction::AccessDenied)
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EventAction> for String {
    fn from(action: EventAction) -> Self {
        action.as_str().to_string()
    }
}

// Deserialization restores the sentinel so serialized history round-trips.
impl From<String> for EventAction {
    fn from(label: String) -> Self {
        if label == ACTION_ACCESS_DENIED {
            EventAction::AccessDenied
        } else {
            EventAction::from_wire(&label)
        }
    }
}

/// One observed or derived occurrence at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingEvent {
    pub action: EventAction,
    pub credential_id: CredentialId,
    pub person: String,
    pub entry_time: String,
    pub exit_time: String,
    pub available_places: u32,
    /// Assigned by the ingestion side when the line was accepted.
    pub observed_at: DateTime<Local>,
}

impl ParkingEvent {
    /// Render the event back into its six-field wire form (no terminator).
    ///
    /// ```
    /// use parkgate_core::{CredentialId, EventAction, ParkingEvent};
    ///
    /// let event = ParkingEvent {
    ///     action: EventAction::Entry,
    ///     credential_id: CredentialId::new("93064AFC"),
    ///     person: "Jane Doe".to_string(),
    ///     entry_time: "2024-01-01 08:00:00".to_string(),
    ///     exit_time: "N/A".to_string(),
    ///     available_places: 9,
    ///     observed_at: chrono::Local::now(),
    /// };
    /// assert_eq!(
    ///     event.to_wire(),
    ///     "Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9"
    /// );
    /// ```
    #[must_use]
    pub fn to_wire(&self) -> String {
        let sep = DELIMITER_FIELD;
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.action,
            self.credential_id,
            self.person,
            self.entry_time,
            self.exit_time,
            self.available_places
        )
    }

    /// Ingestion timestamp formatted for display.
    #[must_use]
    pub fn observed_at_display(&self) -> String {
        self.observed_at.format(OBSERVED_AT_FORMAT).to_string()
    }
}
