//! Access control evaluation.
//!
//! Authorization is a single lookup of the presented credential in a static
//! [`AllowList`]. The terminal has already decremented its occupancy count
//! by the time it reports a tap, so a denial rewrites the event and hands
//! the place back:
//!
//! | Field | Granted | Denied |
//! |-------|---------|--------|
//! | `action` | unchanged | `Access Denied` |
//! | `person` | unchanged | `N/A` |
//! | `entry_time` / `exit_time` | unchanged | `N/A` |
//! | `available_places` | unchanged | incoming + 1 |
//! | `credential_id`, `observed_at` | unchanged | unchanged |
//!
//! # Examples
//!
//! ```
//! use parkgate_monitor::access::{AccessEvaluator, AllowList};
//! use parkgate_protocol::RecordParser;
//!
//! let evaluator = AccessEvaluator::new(AllowList::from_iter(["93064AFC"]));
//!
//! let event = RecordParser::parse("Exit|DEADBEEF|Unknown|N/A|2024-01-01 09:00:00|8").unwrap();
//! let outcome = evaluator.evaluate(event);
//!
//! assert!(outcome.is_denied());
//! assert_eq!(outcome.event().available_places, 9);
//! assert_eq!(outcome.event().person, "N/A");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use parkgate_core::constants::NOT_AVAILABLE;
use parkgate_core::{CredentialId, EventAction, ParkingEvent};

/// Set of authorized credentials. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    credentials: HashSet<CredentialId>,
}

impl AllowList {
    /// Create an empty allow-list (every credential is denied).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the credential is authorized.
    pub fn contains(&self, credential_id: &CredentialId) -> bool {
        self.credentials.contains(credential_id)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialId> {
        self.credentials.iter()
    }
}

impl<T: Into<CredentialId>> FromIterator<T> for AllowList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            credentials: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of evaluating one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Credential authorized; event passed through unchanged.
    Granted(ParkingEvent),

    /// Credential not authorized; event rewritten as a denial.
    Denied(ParkingEvent),
}

impl AccessOutcome {
    #[inline]
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, AccessOutcome::Denied(_))
    }

    /// The event to record.
    #[must_use]
    pub fn event(&self) -> &ParkingEvent {
        match self {
            AccessOutcome::Granted(event) | AccessOutcome::Denied(event) => event,
        }
    }

    #[must_use]
    pub fn into_event(self) -> ParkingEvent {
        match self {
            AccessOutcome::Granted(event) | AccessOutcome::Denied(event) => event,
        }
    }
}

/// Decide authorization for an event against an allow-list.
///
/// Pure: neither session state nor the ledger is touched. Callers apply the
/// returned event and raise the denial signal.
pub fn evaluate(event: ParkingEvent, allow_list: &AllowList) -> AccessOutcome {
    if allow_list.contains(&event.credential_id) {
        return AccessOutcome::Granted(event);
    }

    warn!(
        credential_id = %event.credential_id,
        action = %event.action,
        "Access denied: credential not in allow-list"
    );

    AccessOutcome::Denied(ParkingEvent {
        action: EventAction::AccessDenied,
        person: NOT_AVAILABLE.to_string(),
        entry_time: NOT_AVAILABLE.to_string(),
        exit_time: NOT_AVAILABLE.to_string(),
        available_places: event.available_places.saturating_add(1),
        ..event
    })
}

/// Evaluator bound to a configured allow-list.
///
/// Cloning shares the allow-list.
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    allow_list: Arc<AllowList>,
}

impl AccessEvaluator {
    pub fn new(allow_list: AllowList) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// See [`evaluate`].
    pub fn evaluate(&self, event: ParkingEvent) -> AccessOutcome {
        evaluate(event, &self.allow_list)
    }
}
