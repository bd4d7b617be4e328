//! Current view of the gate: occupancy and the last accepted event.

use serde::{Deserialize, Serialize};

use parkgate_core::ParkingEvent;
use parkgate_core::constants::{DEFAULT_STARTING_PLACES, SESSION_PLACEHOLDER};

/// Occupancy count and a mirror of the most recent event.
///
/// [`SessionState::apply`] is the only mutator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    available_places: u32,
    last_credential_id: String,
    last_person: String,
    last_action: String,
}

impl SessionState {
    pub fn new(starting_places: u32) -> Self {
        Self {
            available_places: starting_places,
            last_credential_id: SESSION_PLACEHOLDER.to_string(),
            last_person: SESSION_PLACEHOLDER.to_string(),
            last_action: SESSION_PLACEHOLDER.to_string(),
        }
    }

    /// Overwrite the view with an accepted event. No validation happens
    /// here; the codec and evaluator already produced a sound event.
    pub fn apply(&mut self, event: &ParkingEvent) {
        self.available_places = event.available_places;
        self.last_credential_id = event.credential_id.to_string();
        self.last_person = event.person.clone();
        self.last_action = event.action.to_string();
    }

    pub fn available_places(&self) -> u32 {
        self.available_places
    }

    pub fn last_credential_id(&self) -> &str {
        &self.last_credential_id
    }

    pub fn last_person(&self) -> &str {
        &self.last_person
    }

    pub fn last_action(&self) -> &str {
        &self.last_action
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_PLACES)
    }
}
