//! Tokio codec for the terminal status stream.
//!
//! `StatusLineCodec` wraps the [`LineFramer`] and [`RecordParser`] behind
//! tokio-util's [`Decoder`] so any byte source, a serial capture file, a
//! socket or an in-memory buffer, can be read as a stream of parking
//! events with `FramedRead`.
//!
//! # Recoverable errors
//!
//! A `Decoder` error terminates a `FramedRead` stream. Protocol errors must
//! not end ingestion, so they are yielded as items:
//!
//! ```text
//! Item  = Result<ParkingEvent, RejectedLine>   // per-line outcome
//! Error = std::io::Error                       // fatal, from the source
//! ```
//!
//! # Usage
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use parkgate_protocol::StatusLineCodec;
//!
//! let mut codec = StatusLineCodec::new();
//! let mut buffer = BytesMut::from(&b"Entry|93064AFC|Jane Doe|N/A|N/A|9\nEntry|ABC\n"[..]);
//!
//! let first = codec.decode(&mut buffer).unwrap().unwrap();
//! assert!(first.is_ok());
//!
//! let second = codec.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(second.unwrap_err().raw_line, "Entry|ABC");
//!
//! assert!(codec.decode(&mut buffer).unwrap().is_none());
//! ```

use std::fmt;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use parkgate_core::{ParkingEvent, ProtocolError};

use crate::framer::{FramedLine, LineFramer};
use crate::parser::RecordParser;

/// A line that could not be turned into an event, with its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub error: ProtocolError,

    /// Line text, lossily decoded. Empty for lines dropped by the framer
    /// before they were complete.
    pub raw_line: String,
}

impl RejectedLine {
    pub fn new(error: ProtocolError, raw_line: impl Into<String>) -> Self {
        Self {
            error,
            raw_line: raw_line.into(),
        }
    }
}

impl fmt::Display for RejectedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in line {:?}", self.error, self.raw_line)
    }
}

impl std::error::Error for RejectedLine {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Outcome of decoding one line.
pub type LineResult = Result<ParkingEvent, RejectedLine>;

/// Decode and parse one framed line.
///
/// Every line yields an outcome. A blank line has no delimiter and is
/// rejected as a one-field record.
///
/// ```
/// use parkgate_protocol::decode_line;
/// use parkgate_core::ProtocolError;
///
/// let blank = decode_line(b"").unwrap_err();
/// assert_eq!(
///     blank.error,
///     ProtocolError::MalformedRecord { field_count: 1, expected: 6 }
/// );
///
/// let rejected = decode_line(b"Entry|\xFF|x|x|x|1").unwrap_err();
/// assert_eq!(rejected.error, ProtocolError::EncodingError { valid_up_to: 6 });
/// ```
pub fn decode_line(bytes: &[u8]) -> LineResult {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        RejectedLine::new(
            ProtocolError::EncodingError {
                valid_up_to: e.valid_up_to(),
            },
            String::from_utf8_lossy(bytes),
        )
    })?;

    trace!(line = text, "Parsing status line");
    RecordParser::parse(text).map_err(|error| RejectedLine::new(error, text))
}

/// Tokio decoder for status lines.
#[derive(Debug, Default)]
pub struct StatusLineCodec {
    framer: LineFramer,
}

impl StatusLineCodec {
    /// Create a codec with the default line length limit.
    pub fn new() -> Self {
        Self {
            framer: LineFramer::new(),
        }
    }

    /// Create a codec with a custom line length limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            framer: LineFramer::with_max_line_length(max_line_length),
        }
    }

    /// Drop buffered partial input and queued lines.
    pub fn reset(&mut self) {
        self.framer.reset();
    }

    /// Bytes buffered for an unterminated line.
    pub fn pending_len(&self) -> usize {
        self.framer.pending_len()
    }

    /// Take the next queued line as an outcome.
    fn next_result(&mut self) -> Option<LineResult> {
        self.framer.next_line().map(Self::resolve)
    }

    fn resolve(line: FramedLine) -> LineResult {
        match line {
            Ok(bytes) => decode_line(&bytes),
            Err(error) => Err(RejectedLine::new(error, String::new())),
        }
    }
}

impl Decoder for StatusLineCodec {
    type Item = LineResult;
    type Error = std::io::Error;

    /// Feed new bytes to the framer and return the next line outcome.
    ///
    /// Returns `Ok(None)` when no complete line is available yet.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            // All bytes now belong to the framer's buffer.
            self.framer.feed(src);
            src.clear();
        }

        Ok(self.next_result())
    }

    /// At end of input, an unterminated final line is treated as complete.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(result) = self.decode(src)? {
            return Ok(Some(result));
        }

        Ok(self
            .framer
            .flush_partial()
            .map(|tail| decode_line(&tail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkgate_core::EventAction;

    const ENTRY_LINE: &[u8] = b"Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9\n";

    #[test]
    fn test_decode_complete_line() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(ENTRY_LINE);

        let event = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(event.action, EventAction::Entry);
        assert_eq!(event.available_places, 9);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(&ENTRY_LINE[..10]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        assert_eq!(codec.pending_len(), 10);

        let mut rest = BytesMut::from(&ENTRY_LINE[10..]);
        let event = codec.decode(&mut rest).unwrap().unwrap().unwrap();
        assert_eq!(event.person, "Jane Doe");
    }

    #[test]
    fn test_decode_multiple_lines_in_buffer() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(ENTRY_LINE);
        buffer.extend_from_slice(b"Exit|93064AFC|Jane Doe|N/A|N/A|10\n");

        let first = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(first.action, EventAction::Entry);

        // Second line is already framed; an empty source still yields it.
        let second = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(second.action, EventAction::Exit);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_reports_blank_lines() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(&b"\r\n   \nEntry|A|B|C|D|1\n"[..]);

        let empty = codec.decode(&mut buffer).unwrap().unwrap().unwrap_err();
        assert_eq!(
            empty.error,
            ProtocolError::MalformedRecord {
                field_count: 1,
                expected: 6
            }
        );
        assert_eq!(empty.raw_line, "");

        let spaces = codec.decode(&mut buffer).unwrap().unwrap().unwrap_err();
        assert!(matches!(
            spaces.error,
            ProtocolError::MalformedRecord { field_count: 1, .. }
        ));
        assert_eq!(spaces.raw_line, "   ");

        let event = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(event.available_places, 1);
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_is_item_not_error() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(&b"Entry|ABC\n"[..]);

        let rejected = codec.decode(&mut buffer).unwrap().unwrap().unwrap_err();
        assert_eq!(
            rejected.error,
            ProtocolError::MalformedRecord {
                field_count: 2,
                expected: 6
            }
        );
        assert_eq!(rejected.raw_line, "Entry|ABC");
    }

    #[test]
    fn test_decode_invalid_utf8_only_affects_its_line() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(b"Entry|\xC3\x28|P|E|X|1\n");
        buffer.extend_from_slice(ENTRY_LINE);

        let rejected = codec.decode(&mut buffer).unwrap().unwrap().unwrap_err();
        assert!(matches!(
            rejected.error,
            ProtocolError::EncodingError { valid_up_to: 6 }
        ));
        assert!(rejected.raw_line.starts_with("Entry|"));

        let event = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(event.credential_id.as_str(), "93064AFC");
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = StatusLineCodec::with_max_line_length(16);
        let mut buffer = BytesMut::from(&b"Entry|93064AFC|Jane Doe|N/A|N/A|9\n"[..]);

        let rejected = codec.decode(&mut buffer).unwrap().unwrap().unwrap_err();
        assert!(matches!(
            rejected.error,
            ProtocolError::LineTooLong { max: 16, .. }
        ));
        assert!(rejected.raw_line.is_empty());
    }

    #[test]
    fn test_decode_eof_flushes_final_line() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(&b"Exit|A1|P|E|X|4"[..]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        let event = codec.decode_eof(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(event.available_places, 4);
        assert!(codec.decode_eof(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_reset_discards_partial_line() {
        let mut codec = StatusLineCodec::new();
        let mut buffer = BytesMut::from(&b"Entry|93064AFC|Ja"[..]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        codec.reset();
        assert_eq!(codec.pending_len(), 0);

        let mut buffer = BytesMut::from(ENTRY_LINE);
        let event = codec.decode(&mut buffer).unwrap().unwrap().unwrap();
        assert_eq!(event.person, "Jane Doe");
    }

    #[test]
    fn test_rejected_line_display() {
        let rejected = RejectedLine::new(
            ProtocolError::MalformedRecord {
                field_count: 1,
                expected: 6,
            },
            "garbage",
        );
        assert_eq!(
            rejected.to_string(),
            "Malformed record: expected 6 fields, got 1 in line \"garbage\""
        );
    }
}
