//! Scriptable serial link for tests and development.
//!
//! [`MockOpener::new`] returns the opener together with a
//! [`MockLinkHandle`]. The handle always talks to the most recently opened
//! link, so a test can reconnect and keep using the same handle.
//!
//! # Examples
//!
//! ```
//! use std::io::Read;
//! use std::time::Duration;
//! use parkgate_serial::link::{LinkOpener, LinkSettings};
//! use parkgate_serial::mock::MockOpener;
//!
//! let (opener, handle) = MockOpener::new();
//! let settings = LinkSettings::new("mock0", 115_200, Duration::from_millis(10));
//! let mut link = opener.open(&settings).unwrap();
//!
//! assert!(handle.send_line("Entry|93064AFC|Jane Doe|N/A|N/A|9"));
//!
//! let mut buf = [0u8; 64];
//! let n = link.read(&mut buf).unwrap();
//! assert!(buf[..n].ends_with(b"|9\n"));
//! ```

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use parkgate_core::ConnectionError;

use crate::link::{LinkOpener, LinkSettings, SerialLink};

#[derive(Debug)]
enum LinkInput {
    Data(Vec<u8>),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockShared {
    /// Sender for the currently open link.
    current: Option<Sender<LinkInput>>,
    /// Reason to refuse the next open.
    refuse_next: Option<String>,
    opened: usize,
    last_settings: Option<LinkSettings>,
}

type Shared = Arc<Mutex<MockShared>>;

fn lock(shared: &Shared) -> MutexGuard<'_, MockShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opener producing [`MockLink`]s.
#[derive(Debug, Clone)]
pub struct MockOpener {
    shared: Shared,
}

impl MockOpener {
    pub fn new() -> (Self, MockLinkHandle) {
        let shared = Shared::default();
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockLinkHandle { shared },
        )
    }
}

impl LinkOpener for MockOpener {
    fn open(&self, settings: &LinkSettings) -> Result<Box<dyn SerialLink>, ConnectionError> {
        let mut shared = lock(&self.shared);
        if let Some(reason) = shared.refuse_next.take() {
            return Err(ConnectionError::open_failed(&settings.port, reason));
        }

        let (tx, rx) = mpsc::channel();
        shared.current = Some(tx);
        shared.opened += 1;
        shared.last_settings = Some(settings.clone());

        Ok(Box::new(MockLink {
            rx,
            read_timeout: settings.read_timeout,
            leftover: Vec::new(),
        }))
    }
}

/// Link fed by a [`MockLinkHandle`].
///
/// Reads block up to the configured timeout and then report `TimedOut`,
/// like a real port with no traffic. A dropped handle reads as a broken
/// pipe.
#[derive(Debug)]
pub struct MockLink {
    rx: Receiver<LinkInput>,
    read_timeout: Duration,
    leftover: Vec<u8>,
}

impl MockLink {
    fn take_leftover(&mut self, buf: &mut [u8]) -> usize {
        let n = self.leftover.len().min(buf.len());
        buf[..n].copy_from_slice(&self.leftover[..n]);
        self.leftover.drain(..n);
        n
    }
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.leftover.is_empty() {
            return Ok(self.take_leftover(buf));
        }

        match self.rx.recv_timeout(self.read_timeout) {
            Ok(LinkInput::Data(bytes)) => {
                self.leftover = bytes;
                Ok(self.take_leftover(buf))
            }
            Ok(LinkInput::Fail(reason)) => Err(io::Error::new(io::ErrorKind::BrokenPipe, reason)),
            Err(RecvTimeoutError::Timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
            }
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock link handle dropped",
            )),
        }
    }
}

/// Controls the link most recently opened by its [`MockOpener`].
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    shared: Shared,
}

impl MockLinkHandle {
    /// Deliver raw bytes. Returns `false` if no link is open.
    pub fn send(&self, bytes: impl AsRef<[u8]>) -> bool {
        self.deliver(LinkInput::Data(bytes.as_ref().to_vec()))
    }

    /// Deliver one terminated status line.
    pub fn send_line(&self, line: &str) -> bool {
        self.send(format!("{line}\n"))
    }

    /// Make the next read on the current link fail as if unplugged.
    pub fn fail_link(&self, reason: impl Into<String>) -> bool {
        self.deliver(LinkInput::Fail(reason.into()))
    }

    /// Make the next `open` fail with the given reason.
    pub fn refuse_next_open(&self, reason: impl Into<String>) {
        lock(&self.shared).refuse_next = Some(reason.into());
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        lock(&self.shared).opened
    }

    pub fn last_settings(&self) -> Option<LinkSettings> {
        lock(&self.shared).last_settings.clone()
    }

    fn deliver(&self, input: LinkInput) -> bool {
        lock(&self.shared)
            .current
            .as_ref()
            .is_some_and(|tx| tx.send(input).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LinkSettings {
        LinkSettings::new("mock0", 115_200, Duration::from_millis(10))
    }

    #[test]
    fn test_send_without_link() {
        let (_opener, handle) = MockOpener::new();
        assert!(!handle.send("data"));
        assert_eq!(handle.open_count(), 0);
    }

    #[test]
    fn test_read_times_out_without_data() {
        let (opener, _handle) = MockOpener::new();
        let mut link = opener.open(&settings()).unwrap();

        let mut buf = [0u8; 8];
        let err = link.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_large_chunk_split_across_reads() {
        let (opener, handle) = MockOpener::new();
        let mut link = opener.open(&settings()).unwrap();
        handle.send(b"0123456789");

        let mut buf = [0u8; 4];
        let mut collected = Vec::new();
        for _ in 0..3 {
            let n = link.read(&mut buf).unwrap();
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(collected, b"0123456789");
    }

    #[test]
    fn test_fail_link() {
        let (opener, handle) = MockOpener::new();
        let mut link = opener.open(&settings()).unwrap();
        assert!(handle.fail_link("unplugged"));

        let err = link.read(&mut [0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.to_string(), "unplugged");
    }

    #[test]
    fn test_refuse_next_open_applies_once() {
        let (opener, handle) = MockOpener::new();
        handle.refuse_next_open("busy");

        let Err(error) = opener.open(&settings()) else {
            panic!("open should have been refused");
        };
        assert_eq!(error, ConnectionError::open_failed("mock0", "busy"));

        assert!(opener.open(&settings()).is_ok());
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.last_settings(), Some(settings()));
    }
}
