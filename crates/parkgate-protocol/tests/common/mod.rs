//! Common test utilities for protocol integration tests.

#![allow(dead_code)]

/// Authorized card used throughout the tests.
pub const AUTHORIZED_CARD: &str = "93064AFC";

/// Card that is never on an allow-list.
pub const UNKNOWN_CARD: &str = "DEADBEEF";

/// Build one terminated wire line.
pub fn wire_line(action: &str, card: &str, person: &str, places: u32) -> String {
    format!("{action}|{card}|{person}|2024-01-01 08:00:00|N/A|{places}\n")
}

/// Build `count` entry lines with places counting down from `count`.
pub fn entry_lines(count: u32) -> Vec<String> {
    (0..count)
        .map(|i| wire_line("Entry", AUTHORIZED_CARD, &format!("Driver {i}"), count - i))
        .collect()
}
