//! Line protocol codec for the parking gate terminal.
//!
//! ```text
//! serial bytes -> LineFramer -> decode_line (UTF-8) -> RecordParser -> ParkingEvent
//!                 \___________ StatusLineCodec (tokio-util Decoder) ___________/
//! ```

pub mod codec;
pub mod framer;
pub mod parser;

pub use codec::{LineResult, RejectedLine, StatusLineCodec, decode_line};
pub use framer::{DrainLines, FramedLine, FramerState, LineFramer};
pub use parser::RecordParser;
