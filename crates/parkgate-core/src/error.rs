//! Error taxonomy shared by every parkgate crate.
//!
//! Errors are split by how far they propagate:
//!
//! - [`ProtocolError`]: one bad line. Reported, the line is discarded and
//!   ingestion continues.
//! - [`ConnectionError`]: the serial link itself failed. Ends the session
//!   until the caller reconnects.
//! - [`ConfigError`]: configuration could not be read or is invalid.

use thiserror::Error;

/// A status line that could not be turned into a parking event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Wrong number of `|`-separated fields (including none at all).
    #[error("Malformed record: expected {expected} fields, got {field_count}")]
    MalformedRecord { field_count: usize, expected: usize },

    /// A field is present but its value is not acceptable.
    #[error("Invalid field '{field}': {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// The line is not valid UTF-8.
    #[error("Invalid UTF-8 in line (valid up to byte {valid_up_to})")]
    EncodingError { valid_up_to: usize },

    /// The line exceeded the framer's length limit before its terminator.
    #[error("Line too long: {length} bytes exceeds maximum {max}")]
    LineTooLong { length: usize, max: usize },
}

/// Failure of the serial link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The device could not be opened (absent, busy, permission denied).
    #[error("Failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// The link failed mid-session.
    #[error("Link to {port} lost: {reason}")]
    LinkLost { port: String, reason: String },
}

impl ConnectionError {
    /// Create a new open failure.
    pub fn open_failed(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            port: port.into(),
            reason: reason.into(),
        }
    }

    /// Create a new link loss.
    pub fn link_lost(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LinkLost {
            port: port.into(),
            reason: reason.into(),
        }
    }

    /// Device identifier the error refers to.
    pub fn port(&self) -> &str {
        match self {
            Self::OpenFailed { port, .. } | Self::LinkLost { port, .. } => port,
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
