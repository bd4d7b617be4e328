//! Property-based tests for status line parsing and framing.
//!
//! These tests use proptest to check parser and framer invariants over
//! generated input instead of a handful of fixed lines.

use proptest::prelude::*;
use parkgate_core::{EventAction, ProtocolError};
use parkgate_protocol::{LineFramer, RecordParser};

/// Field text without delimiters or line breaks.
fn field_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 :/-]{0,24}")
        .expect("Failed to create field regex strategy")
}

/// Hex card UID, 4 to 10 bytes.
fn card_uid() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-F]{8,20}").expect("Failed to create UID regex strategy")
}

fn action_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Entry".to_string()),
        Just("Exit".to_string()),
        prop::string::string_regex("[A-Za-z]{1,12}").expect("Failed to create label strategy"),
    ]
}

proptest! {
    /// Property: every six-field line with a numeric last field parses and
    /// keeps its field values.
    #[test]
    fn prop_valid_line_parses(
        action in action_label(),
        card in card_uid(),
        person in field_text(),
        entry in field_text(),
        exit in field_text(),
        places in any::<u32>(),
    ) {
        let line = format!("{action}|{card}|{person}|{entry}|{exit}|{places}");
        let event = RecordParser::parse(&line).unwrap();

        prop_assert_eq!(event.action.as_str(), action.as_str());
        prop_assert_eq!(event.credential_id.as_str(), card.as_str());
        prop_assert_eq!(&event.person, &person);
        prop_assert_eq!(&event.entry_time, &entry);
        prop_assert_eq!(&event.exit_time, &exit);
        prop_assert_eq!(event.available_places, places);
        prop_assert!(!event.action.is_access_denied());
    }

    /// Property: any field count other than six is a malformed record.
    #[test]
    fn prop_wrong_field_count_rejected(
        fields in prop::collection::vec(field_text(), 1..12usize)
            .prop_filter("exactly six fields is valid", |f| f.len() != 6),
    ) {
        let line = fields.join("|");
        let result = RecordParser::parse(&line);
        let is_malformed = matches!(result, Err(ProtocolError::MalformedRecord { .. }));
        prop_assert!(is_malformed);
    }

    /// Property: a non-numeric occupancy field is an invalid field.
    #[test]
    fn prop_non_numeric_places_rejected(places in "[A-Za-z]{1,8}") {
        let line = format!("Entry|93064AFC|P|E|X|{places}");
        let result = RecordParser::parse(&line);
        let is_invalid = matches!(result, Err(ProtocolError::InvalidField { .. }));
        prop_assert!(is_invalid);
    }

    /// Property: framing does not depend on how the stream is chunked.
    #[test]
    fn prop_framing_independent_of_chunking(
        lines in prop::collection::vec("[A-Za-z0-9|]{0,40}", 1..20usize),
        chunk_size in 1usize..64,
    ) {
        let stream: String = lines.iter().map(|l| format!("{l}\n")).collect();

        let mut framer = LineFramer::new();
        for chunk in stream.as_bytes().chunks(chunk_size) {
            framer.feed(chunk);
        }

        let framed: Vec<String> = framer
            .drain_lines()
            .map(|line| String::from_utf8(line.unwrap().to_vec()).unwrap())
            .collect();

        prop_assert_eq!(framed, lines);
        prop_assert_eq!(framer.pending_len(), 0);
    }
}

#[test]
fn test_entry_and_exit_labels_are_recognized() {
    let entry = RecordParser::parse("Entry|A1|P|E|X|1").unwrap();
    let exit = RecordParser::parse("Exit|A1|P|E|X|1").unwrap();
    assert_eq!(entry.action, EventAction::Entry);
    assert_eq!(exit.action, EventAction::Exit);
}
