//! Device seam between the supervisor and a serial port.
//!
//! The supervisor only needs a blocking byte source with a bounded read
//! timeout. [`LinkOpener`] produces one from [`LinkSettings`];
//! [`SerialPortOpener`] is the hardware implementation and
//! [`crate::mock::MockOpener`] stands in for it in tests.

use std::io;
use std::time::Duration;

use tracing::debug;

use parkgate_core::{ConnectionError, Error, SerialSettings};

/// Blocking byte source for the read loop.
///
/// Reads must return within the configured timeout, reporting
/// [`io::ErrorKind::TimedOut`] when no data arrived.
pub trait SerialLink: io::Read + Send {}

impl<T: io::Read + Send + ?Sized> SerialLink for T {}

/// Opens serial links.
pub trait LinkOpener: Send + Sync {
    /// Open a link with the given settings.
    ///
    /// # Errors
    /// Returns [`ConnectionError::OpenFailed`] if the device cannot be opened.
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, ConnectionError>;
}

/// Parameters for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl LinkSettings {
    pub fn new(port: impl Into<String>, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout,
        }
    }

    /// Settings from configuration, or `None` if no port is configured.
    pub fn from_config(serial: &SerialSettings) -> Option<Self> {
        let port = serial.port.as_ref()?;
        Some(Self::new(port, serial.baud_rate, serial.read_timeout()))
    }
}

/// Opens real serial ports via the `serialport` crate (8N1, no flow control).
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortOpener;

impl LinkOpener for SerialPortOpener {
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, ConnectionError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| ConnectionError::open_failed(&settings.port, e.to_string()))?;

        debug!(port = %settings.port, baud_rate = settings.baud_rate, "Serial port opened");
        Ok(Box::new(port))
    }
}

/// Names of the serial devices the platform reports.
///
/// # Errors
/// Returns [`Error::Io`] if enumeration fails.
pub fn available_ports() -> Result<Vec<String>, Error> {
    let ports = serialport::available_ports().map_err(io::Error::from)?;
    Ok(ports.into_iter().map(|info| info.port_name).collect())
}
