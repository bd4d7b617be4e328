//! Serial connection handling for the parking gate monitor.
//!
//! The [`ConnectionSupervisor`] opens a link through a [`LinkOpener`], runs
//! a background reader that frames and parses the terminal's status lines,
//! and hands every result to a [`parkgate_monitor::Monitor`].
//!
//! Real hardware goes through [`SerialPortOpener`]; tests and demos use
//! [`MockOpener`].

pub mod link;
pub mod mock;
pub mod supervisor;

pub use link::{LinkOpener, LinkSettings, SerialLink, SerialPortOpener, available_ports};
pub use mock::{MockLink, MockLinkHandle, MockOpener};
pub use supervisor::ConnectionSupervisor;
