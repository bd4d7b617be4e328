//! Core constants for the parking terminal status protocol.
//!
//! The gate terminal reports every card tap as one newline-terminated line
//! of six `|`-separated fields:
//!
//! ```text
//! ACTION|CREDENTIAL_ID|PERSON|ENTRY_TIME|EXIT_TIME|AVAILABLE_PLACES\n
//! ```
//!
//! | Position | Field | Example |
//! |----------|-------|---------|
//! | 0 | Action label | `Entry` |
//! | 1 | Card UID | `93064AFC` |
//! | 2 | Person | `Jane Doe` |
//! | 3 | Entry time | `2024-01-01 08:00:00` |
//! | 4 | Exit time | `N/A` |
//! | 5 | Available places | `9` |
//!
//! # Usage
//!
//! ```
//! use parkgate_core::constants::*;
//!
//! let line = "Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9";
//! assert_eq!(line.split(DELIMITER_FIELD).count(), FIELD_COUNT);
//! ```

// ============================================================================
// Wire Format
// ============================================================================

/// Field separator in status lines.
pub const DELIMITER_FIELD: char = '|';

/// Line terminator ending every status record.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Carriage return, stripped when it precedes [`LINE_TERMINATOR`].
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Number of fields in a well-formed status record.
pub const FIELD_COUNT: usize = 6;

/// Maximum buffered line length (bytes) before the framer gives up on it.
///
/// Status lines from the terminal are well under 100 bytes. A line that
/// grows past this limit without a terminator is discarded and reported,
/// so a noisy link cannot grow the buffer without bound.
pub const MAX_LINE_LENGTH: usize = 1024;

// ============================================================================
// Sentinels
// ============================================================================

/// Action label written by the evaluator for unauthorized credentials.
pub const ACTION_ACCESS_DENIED: &str = "Access Denied";

/// Action label for a vehicle entering.
pub const ACTION_ENTRY: &str = "Entry";

/// Action label for a vehicle leaving.
pub const ACTION_EXIT: &str = "Exit";

/// Placeholder for unknown or withheld field values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder shown in the session view before the first event.
pub const SESSION_PLACEHOLDER: &str = "-";

/// Format of the ingestion timestamp (`observed_at`) in presentation output.
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Defaults
// ============================================================================

/// Occupancy count before the terminal reports anything.
pub const DEFAULT_STARTING_PLACES: u32 = 10;

/// Number of events kept in the history ledger.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Serial baud rate used by the gate terminal firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial read timeout (milliseconds).
///
/// Bounds how long the read loop blocks, and therefore how quickly a
/// disconnect request is observed.
///
/// ```
/// use parkgate_core::constants::DEFAULT_READ_TIMEOUT_MS;
/// use std::time::Duration;
///
/// let timeout = Duration::from_millis(DEFAULT_READ_TIMEOUT_MS);
/// assert_eq!(timeout.as_secs(), 1);
/// ```
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
