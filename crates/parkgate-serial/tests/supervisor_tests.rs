//! Supervisor tests against the mock link.
//!
//! The reader runs on its own thread, so assertions wait for signals with a
//! deadline instead of sleeping for a fixed time.

use std::thread;
use std::time::{Duration, Instant};

use parkgate_core::{ConnectionError, EventAction, MonitorConfig};
use parkgate_monitor::{Monitor, MonitorSignal, SignalReceiver};
use parkgate_serial::{ConnectionSupervisor, LinkSettings, MockLinkHandle, MockOpener};

const READ_TIMEOUT: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    supervisor: ConnectionSupervisor<MockOpener>,
    handle: MockLinkHandle,
    signals: SignalReceiver,
}

fn harness() -> Harness {
    let config = MonitorConfig {
        allow_list: vec!["93064AFC".to_string()],
        ..MonitorConfig::default()
    };
    let (monitor, signals) = Monitor::new(&config);
    let (opener, handle) = MockOpener::new();
    Harness {
        supervisor: ConnectionSupervisor::new(opener, monitor),
        handle,
        signals,
    }
}

fn settings() -> LinkSettings {
    LinkSettings::new("mock0", 115_200, READ_TIMEOUT)
}

/// Wait for the next signal, failing the test after `WAIT`.
fn recv_within(signals: &mut SignalReceiver) -> MonitorSignal {
    let deadline = Instant::now() + WAIT;
    loop {
        if let Ok(signal) = signals.try_recv() {
            return signal;
        }
        assert!(Instant::now() < deadline, "no signal within {WAIT:?}");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_connect_and_receive_event() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    assert!(h.supervisor.is_connected());
    assert_eq!(h.supervisor.port(), Some("mock0"));
    assert_eq!(h.handle.last_settings(), Some(settings()));

    assert!(h.handle.send_line("Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9"));

    let MonitorSignal::Event(event) = recv_within(&mut h.signals) else {
        panic!("expected an event");
    };
    assert_eq!(event.action, EventAction::Entry);
    assert_eq!(h.supervisor.monitor().view().session().available_places(), 9);
}

#[test]
fn test_denial_through_link() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    h.handle.send_line("Exit|DEADBEEF|Unknown|N/A|2024-01-01 09:00:00|8");

    assert!(matches!(recv_within(&mut h.signals), MonitorSignal::Event(_)));
    assert!(matches!(
        recv_within(&mut h.signals),
        MonitorSignal::AccessDenied { .. }
    ));
    assert_eq!(h.supervisor.monitor().view().session().available_places(), 9);
}

#[test]
fn test_line_split_across_reads() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();

    h.handle.send("Entry|93064AFC|Ja");
    thread::sleep(READ_TIMEOUT * 3);
    h.handle.send("ne Doe|N/A|N/A|7\n");

    let MonitorSignal::Event(event) = recv_within(&mut h.signals) else {
        panic!("expected an event");
    };
    assert_eq!(event.person, "Jane Doe");
    assert_eq!(event.available_places, 7);
}

#[test]
fn test_protocol_error_keeps_reading() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();

    h.handle.send("Entry|ABC\nEntry|93064AFC|Jane Doe|N/A|N/A|6\n");

    assert!(matches!(
        recv_within(&mut h.signals),
        MonitorSignal::ProtocolError { .. }
    ));
    assert!(matches!(recv_within(&mut h.signals), MonitorSignal::Event(_)));
    assert!(h.supervisor.is_connected());
}

#[test]
fn test_disconnect_is_idempotent() {
    let mut h = harness();
    h.supervisor.disconnect();

    h.supervisor.connect(settings()).unwrap();
    h.supervisor.disconnect();
    h.supervisor.disconnect();

    assert!(!h.supervisor.is_connected());
    assert_eq!(h.supervisor.port(), None);
    assert!(h.signals.try_recv().is_err());
}

#[test]
fn test_reconnect_discards_partial_line() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    h.handle.send("Entry|93064AFC|Half");
    thread::sleep(READ_TIMEOUT * 3);

    h.supervisor.connect(settings()).unwrap();
    assert_eq!(h.handle.open_count(), 2);

    h.handle.send_line("Exit|93064AFC|Jane Doe|N/A|N/A|10");

    let MonitorSignal::Event(event) = recv_within(&mut h.signals) else {
        panic!("expected an event");
    };
    assert_eq!(event.action, EventAction::Exit);
    assert_eq!(event.person, "Jane Doe");
}

#[test]
fn test_state_survives_reconnect() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    h.handle.send_line("Entry|93064AFC|Jane Doe|N/A|N/A|4");
    recv_within(&mut h.signals);

    h.supervisor.disconnect();
    h.supervisor.connect(settings()).unwrap();

    let view = h.supervisor.monitor().view();
    assert_eq!(view.session().available_places(), 4);
    assert_eq!(view.history_len(), 1);
}

#[test]
fn test_link_loss() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    assert!(h.handle.fail_link("device unplugged"));

    let MonitorSignal::ConnectionError(error) = recv_within(&mut h.signals) else {
        panic!("expected a connection error");
    };
    assert_eq!(
        error,
        ConnectionError::link_lost("mock0", "device unplugged")
    );
    assert!(!h.supervisor.is_connected());

    // Closing after loss still works and emits nothing further.
    h.supervisor.disconnect();
    assert!(h.signals.try_recv().is_err());
}

#[test]
fn test_link_loss_drops_partial_line() {
    let mut h = harness();
    h.supervisor.connect(settings()).unwrap();
    assert!(h.handle.send("Entry|93064AFC|Ha"));
    assert!(h.handle.fail_link("device unplugged"));

    assert!(matches!(
        recv_within(&mut h.signals),
        MonitorSignal::ConnectionError(ConnectionError::LinkLost { .. })
    ));
    assert!(h.signals.try_recv().is_err());
    assert_eq!(h.supervisor.monitor().view().history_len(), 0);

    // The fragment does not prefix the first line of the next connection.
    h.supervisor.connect(settings()).unwrap();
    h.handle.send_line("Entry|93064AFC|Jane Doe|N/A|N/A|7");
    let MonitorSignal::Event(event) = recv_within(&mut h.signals) else {
        panic!("expected an event");
    };
    assert_eq!(event.person, "Jane Doe");
    assert_eq!(event.available_places, 7);
}

#[test]
fn test_open_failure() {
    let mut h = harness();
    h.handle.refuse_next_open("port busy");

    let error = h.supervisor.connect(settings()).unwrap_err();
    assert_eq!(error, ConnectionError::open_failed("mock0", "port busy"));
    assert!(!h.supervisor.is_connected());

    assert_eq!(
        recv_within(&mut h.signals),
        MonitorSignal::ConnectionError(error)
    );

    // A later attempt succeeds.
    h.supervisor.connect(settings()).unwrap();
    assert!(h.supervisor.is_connected());
}
