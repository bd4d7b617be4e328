//! Connection supervisor.
//!
//! Owns the serial link and the background reader. At most one connection
//! is active; each runs its own reader thread with a fresh
//! [`StatusLineCodec`], so a partial line from a previous connection never
//! leaks into the next one.
//!
//! # Lifecycle
//!
//! ```text
//!            connect() ok
//!   Closed ─────────────────> Open
//!     ^                        │
//!     │  disconnect()          │  read error
//!     └────────────────────────┤  (LinkLost signalled)
//!                              v
//!                        Closed (worker exited)
//! ```
//!
//! Read timeouts, interrupted reads and empty reads mean "no data" and keep
//! the loop going. Any other read error ends the connection. There is no
//! automatic reconnection; the caller decides whether to call
//! [`ConnectionSupervisor::connect`] again.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use parkgate_core::MonitorConfig;
//! use parkgate_monitor::Monitor;
//! use parkgate_serial::{ConnectionSupervisor, LinkSettings, MockOpener};
//!
//! let (opener, _handle) = MockOpener::new();
//! let (monitor, _signals) = Monitor::new(&MonitorConfig::default());
//! let mut supervisor = ConnectionSupervisor::new(opener, monitor);
//!
//! supervisor
//!     .connect(LinkSettings::new("mock0", 115_200, Duration::from_millis(10)))
//!     .unwrap();
//! assert!(supervisor.is_connected());
//!
//! supervisor.disconnect();
//! supervisor.disconnect();
//! assert!(!supervisor.is_connected());
//! ```

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, error, info};

use parkgate_core::ConnectionError;
use parkgate_monitor::Monitor;
use parkgate_protocol::StatusLineCodec;

use crate::link::{LinkOpener, LinkSettings, SerialLink};

/// Size of a single read from the link.
const READ_CHUNK_SIZE: usize = 256;

struct ActiveConnection {
    port: String,
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// Manages the serial connection and its reader thread.
pub struct ConnectionSupervisor<O: LinkOpener> {
    opener: O,
    monitor: Monitor,
    connection: Option<ActiveConnection>,
}

impl<O: LinkOpener> ConnectionSupervisor<O> {
    pub fn new(opener: O, monitor: Monitor) -> Self {
        Self {
            opener,
            monitor,
            connection: None,
        }
    }

    /// Open the link and start reading.
    ///
    /// An existing connection is closed first.
    ///
    /// # Errors
    /// Returns [`ConnectionError::OpenFailed`] if the link cannot be opened
    /// or the reader thread cannot be started. The error is also signalled.
    pub fn connect(&mut self, settings: LinkSettings) -> Result<(), ConnectionError> {
        if self.connection.is_some() {
            debug!("Replacing existing connection");
            self.disconnect();
        }

        info!(
            port = %settings.port,
            baud_rate = settings.baud_rate,
            read_timeout = ?settings.read_timeout,
            "Connecting to serial port"
        );

        let connection = self.start(&settings).inspect_err(|e| {
            self.monitor.report_connection_error(e.clone());
        })?;

        info!(port = %settings.port, "Serial link open");
        self.connection = Some(connection);
        Ok(())
    }

    fn start(&self, settings: &LinkSettings) -> Result<ActiveConnection, ConnectionError> {
        let link = self.opener.open(settings)?;

        let stop = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let reader = ReadLoop {
            link,
            port: settings.port.clone(),
            codec: StatusLineCodec::new(),
            monitor: self.monitor.clone(),
            stop: Arc::clone(&stop),
            alive: Arc::clone(&alive),
        };

        let worker = thread::Builder::new()
            .name(format!("parkgate-reader-{}", settings.port))
            .spawn(move || reader.run())
            .map_err(|e| ConnectionError::open_failed(&settings.port, e.to_string()))?;

        Ok(ActiveConnection {
            port: settings.port.clone(),
            stop,
            alive,
            worker,
        })
    }

    /// Stop the reader and release the link.
    ///
    /// Returns within about one read timeout. Calling this while closed
    /// does nothing.
    pub fn disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            debug!("Disconnect requested with no open link");
            return;
        };

        connection.stop.store(true, Ordering::Release);
        if connection.worker.join().is_err() {
            error!(port = %connection.port, "Serial reader thread panicked");
        }

        info!(port = %connection.port, "Serial link closed");
    }

    /// `true` while a link is open and its reader has not hit an error.
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.alive.load(Ordering::Acquire))
    }

    /// Port of the current connection, even if the link was lost.
    pub fn port(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.port.as_str())
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }
}

impl<O: LinkOpener> Drop for ConnectionSupervisor<O> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Body of the reader thread for one connection.
struct ReadLoop {
    link: Box<dyn SerialLink>,
    port: String,
    codec: StatusLineCodec,
    monitor: Monitor,
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
}

impl ReadLoop {
    fn run(mut self) {
        debug!(port = %self.port, "Serial reader started");

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut pending = BytesMut::with_capacity(READ_CHUNK_SIZE);

        while !self.stop.load(Ordering::Acquire) {
            let result = self
                .link
                .read(&mut chunk)
                .and_then(|n| {
                    pending.extend_from_slice(&chunk[..n]);
                    self.dispatch(&mut pending)
                });

            match result {
                Ok(()) => {}
                Err(e) if is_idle(&e) => {}
                Err(e) => {
                    self.alive.store(false, Ordering::Release);
                    debug!(
                        port = %self.port,
                        discarded_bytes = self.codec.pending_len(),
                        "Dropping partial line on link loss"
                    );
                    self.monitor
                        .report_connection_error(ConnectionError::link_lost(&self.port, e.to_string()));
                    return;
                }
            }
        }

        debug!(port = %self.port, "Serial reader stopped");
    }

    /// Hand every complete line in `pending` to the monitor.
    fn dispatch(&mut self, pending: &mut BytesMut) -> io::Result<()> {
        while let Some(line) = self.codec.decode(pending)? {
            self.monitor.ingest(line);
        }
        Ok(())
    }
}

/// Read outcomes that mean "nothing arrived yet".
fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}
