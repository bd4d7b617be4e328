//! Monitor configuration.
//!
//! Every option has a default, so an empty document is a valid
//! configuration. Example TOML:
//!
//! ```toml
//! starting_places = 10
//! allow_list = ["93064AFC", "04A1B2C3"]
//! history_capacity = 100
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! read_timeout_ms = 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_HISTORY_CAPACITY, DEFAULT_READ_TIMEOUT_MS, DEFAULT_STARTING_PLACES,
};
use crate::error::ConfigError;

/// Options recognized by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Occupancy count shown until the terminal reports one.
    pub starting_places: u32,

    /// Credential identifiers authorized for access.
    pub allow_list: Vec<String>,

    /// Number of events retained in the history ledger.
    pub history_capacity: usize,

    /// Serial link parameters.
    pub serial: SerialSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            starting_places: DEFAULT_STARTING_PLACES,
            allow_list: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            serial: SerialSettings::default(),
        }
    }
}

/// Serial link parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSettings {
    /// Platform device path or name (`/dev/ttyUSB0`, `COM3`).
    pub port: Option<String>,

    pub baud_rate: u32,

    /// Upper bound on a single blocking read.
    pub read_timeout_ms: u64,
}

impl SerialSettings {
    /// Read timeout as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for malformed TOML or unknown keys and
    /// `ConfigError::Invalid` when a value fails validation.
    ///
    /// ```
    /// use parkgate_core::MonitorConfig;
    ///
    /// let config = MonitorConfig::from_toml_str("allow_list = [\"93064AFC\"]").unwrap();
    /// assert_eq!(config.allow_list, vec!["93064AFC".to_string()]);
    /// assert_eq!(config.history_capacity, 100);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise the
    /// same errors as [`MonitorConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value constraints.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the history capacity is zero, the
    /// baud rate is zero, or the read timeout is zero (reads must be bounded
    /// but never busy-spin).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid(
                "serial.baud_rate must be greater than 0".to_string(),
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "serial.read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.allow_list.iter().any(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "allow_list entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
