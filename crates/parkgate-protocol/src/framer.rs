//! Line framer for the terminal's serial byte stream.
//!
//! Serial reads arrive in arbitrary chunks: half a line, one line, several
//! lines, or a line split across many reads. [`LineFramer`] buffers bytes
//! and emits one frame per newline-terminated line, keeping any trailing
//! partial line for the next [`feed`](LineFramer::feed).
//!
//! # Usage
//!
//! ```
//! use parkgate_protocol::LineFramer;
//!
//! let mut framer = LineFramer::new();
//!
//! framer.feed(b"Entry|93064AFC|Ja");
//! assert!(framer.next_line().is_none());
//!
//! framer.feed(b"ne Doe|N/A|N/A|9\r\n");
//! let line = framer.next_line().unwrap().unwrap();
//! assert_eq!(&line[..], b"Entry|93064AFC|Jane Doe|N/A|N/A|9");
//! ```

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;

use parkgate_core::ProtocolError;
use parkgate_core::constants::{CARRIAGE_RETURN, LINE_TERMINATOR, MAX_LINE_LENGTH};

/// Initial buffer capacity for incoming serial data.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Initial capacity of the completed-line queue.
const INITIAL_LINE_QUEUE_CAPACITY: usize = 4;

/// A framed line (terminator and trailing `\r` removed) or the reason
/// buffered bytes had to be dropped.
pub type FramedLine = std::result::Result<Bytes, ProtocolError>;

/// Framer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Accumulating bytes of the current line.
    Collecting,

    /// The current line overflowed [`MAX_LINE_LENGTH`]; bytes are dropped
    /// until the next terminator.
    Discarding,
}

/// Stateful newline framer.
///
/// ```text
/// ┌────────────┐  len > max, no '\n'  ┌────────────┐
/// │ Collecting │─────────────────────>│ Discarding │
/// └────────────┘                      └────────────┘
///    │  ^   ^                                │
///    │  │   └────────────── '\n' ────────────┘
///    └──┘ '\n': line queued
/// ```
///
/// An overflow is reported once, as [`ProtocolError::LineTooLong`], in
/// line order with the surrounding lines.
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    state: FramerState,
    lines: VecDeque<FramedLine>,
    max_line_length: usize,
}

impl LineFramer {
    /// Create a framer with the default line length limit.
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a framer with a custom line length limit (bytes, excluding
    /// the terminator).
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: FramerState::Collecting,
            lines: VecDeque::with_capacity(INITIAL_LINE_QUEUE_CAPACITY),
            max_line_length,
        }
    }

    /// Append bytes from the link and frame every completed line.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        while self.try_extract_line() {}

        self.enforce_length_limit();
    }

    /// Next completed line, if any.
    pub fn next_line(&mut self) -> Option<FramedLine> {
        self.lines.pop_front()
    }

    /// Iterator over all currently completed lines.
    ///
    /// ```
    /// use parkgate_protocol::LineFramer;
    ///
    /// let mut framer = LineFramer::new();
    /// framer.feed(b"first\nsecond\nthi");
    ///
    /// let lines: Vec<_> = framer.drain_lines().collect();
    /// assert_eq!(lines.len(), 2);
    /// assert_eq!(framer.pending_len(), 3);
    /// ```
    pub fn drain_lines(&mut self) -> DrainLines<'_> {
        DrainLines { framer: self }
    }

    /// Number of completed lines waiting to be taken.
    pub fn lines_available(&self) -> usize {
        self.lines.len()
    }

    /// Number of buffered bytes belonging to an unterminated line.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Take the unterminated tail as a final line (end of input).
    ///
    /// Returns `None` if nothing is buffered or the tail belongs to an
    /// overflowed line.
    pub fn flush_partial(&mut self) -> Option<Bytes> {
        let discarding = self.state == FramerState::Discarding;
        self.state = FramerState::Collecting;

        if self.buffer.is_empty() || discarding {
            self.buffer.clear();
            return None;
        }

        let mut line = self.buffer.split();
        strip_carriage_return(&mut line);
        Some(line.freeze())
    }

    /// Discard all buffered bytes and queued lines.
    ///
    /// Called when a connection is reopened so nothing from the previous
    /// session leaks into the next one.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.lines.clear();
        self.state = FramerState::Collecting;
    }

    /// Frame one line from the buffer. Returns `true` if a terminator was
    /// consumed.
    fn try_extract_line(&mut self) -> bool {
        let Some(pos) = self.buffer.iter().position(|&b| b == LINE_TERMINATOR) else {
            return false;
        };

        let mut line = self.buffer.split_to(pos + 1);

        if self.state == FramerState::Discarding {
            // Tail of an overflowed line.
            self.state = FramerState::Collecting;
            return true;
        }

        line.truncate(pos);
        strip_carriage_return(&mut line);

        if line.len() > self.max_line_length {
            self.lines.push_back(Err(ProtocolError::LineTooLong {
                length: line.len(),
                max: self.max_line_length,
            }));
        } else {
            self.lines.push_back(Ok(line.freeze()));
        }
        true
    }

    /// Drop an unterminated line that outgrew the limit.
    ///
    /// A trailing `\r` may be the first half of a split CRLF, so it does
    /// not count towards the line length.
    fn enforce_length_limit(&mut self) {
        let content_len =
            self.buffer.len() - usize::from(self.buffer.last() == Some(&CARRIAGE_RETURN));
        match self.state {
            FramerState::Collecting if content_len > self.max_line_length => {
                self.lines.push_back(Err(ProtocolError::LineTooLong {
                    length: content_len,
                    max: self.max_line_length,
                }));
                self.buffer.clear();
                self.state = FramerState::Discarding;
            }
            FramerState::Discarding => self.buffer.clear(),
            FramerState::Collecting => {}
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_carriage_return(line: &mut BytesMut) {
    if line.last() == Some(&CARRIAGE_RETURN) {
        line.truncate(line.len() - 1);
    }
}

/// Iterator that drains completed lines from a [`LineFramer`].
///
/// Created by [`LineFramer::drain_lines`]. It does not read more input;
/// call [`LineFramer::feed`] first.
pub struct DrainLines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for DrainLines<'_> {
    type Item = FramedLine;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.framer.lines_available();
        (len, Some(len))
    }
}
