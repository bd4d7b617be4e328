pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{MonitorConfig, SerialSettings};
pub use error::{ConfigError, ConnectionError, Error, ProtocolError, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
