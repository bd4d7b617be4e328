//! Status record parser.
//!
//! Converts one framed line into a [`ParkingEvent`].
//!
//! # Record Format
//!
//! ```text
//! ACTION|CREDENTIAL_ID|PERSON|ENTRY_TIME|EXIT_TIME|AVAILABLE_PLACES
//! ```
//!
//! Exactly six fields. Fields may be empty (`Entry||...` is six fields);
//! only the field count and the numeric occupancy field are validated.
//!
//! # Examples
//!
//! ```
//! use parkgate_protocol::RecordParser;
//! use parkgate_core::EventAction;
//!
//! let event = RecordParser::parse("Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9").unwrap();
//! assert_eq!(event.action, EventAction::Entry);
//! assert_eq!(event.credential_id.as_str(), "93064AFC");
//! assert_eq!(event.available_places, 9);
//!
//! // Wrong field count is reported, not dropped
//! assert!(RecordParser::parse("Entry|ABC").is_err());
//! ```

use chrono::{DateTime, Local};

use parkgate_core::constants::{DELIMITER_FIELD, FIELD_COUNT};
use parkgate_core::{CredentialId, EventAction, ParkingEvent, ProtocolError};

/// Parser for status records.
pub struct RecordParser;

impl RecordParser {
    /// Parse a record, stamping it with the current local time.
    ///
    /// # Errors
    /// See [`RecordParser::parse_at`].
    pub fn parse(input: &str) -> Result<ParkingEvent, ProtocolError> {
        Self::parse_at(input, Local::now())
    }

    /// Parse a record with an explicit `observed_at` timestamp.
    ///
    /// Leading and trailing whitespace of the line is ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedRecord` if the line does not split into
    ///   exactly six fields (a line with no `|` counts as one field).
    /// - `ProtocolError::InvalidField` if `available_places` is not a
    ///   non-negative integer.
    pub fn parse_at(
        input: &str,
        observed_at: DateTime<Local>,
    ) -> Result<ParkingEvent, ProtocolError> {
        let line = input.trim();
        let fields: Vec<&str> = line.split(DELIMITER_FIELD).collect();

        let &[action, credential_id, person, entry_time, exit_time, places] = fields.as_slice()
        else {
            return Err(ProtocolError::MalformedRecord {
                field_count: fields.len(),
                expected: FIELD_COUNT,
            });
        };

        let available_places = parse_places(places)?;

        Ok(ParkingEvent {
            action: EventAction::from_wire(action),
            credential_id: CredentialId::new(credential_id),
            person: person.to_string(),
            entry_time: entry_time.to_string(),
            exit_time: exit_time.to_string(),
            available_places,
            observed_at,
        })
    }
}

fn parse_places(value: &str) -> Result<u32, ProtocolError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ProtocolError::InvalidField {
            field: "available_places",
            value: value.to_string(),
        })
}
