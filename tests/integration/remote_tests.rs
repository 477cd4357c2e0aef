//! Host-driven flows over the simulated serial link.

use quadpack::app::commands::AppCommand;
use quadpack::app::events::AppEvent;
use quadpack::config::TesterConfig;
use quadpack::control::RunOutcome;
use quadpack::error::ProtocolError;
use quadpack::events::ButtonPress::{Down, Ok};
use quadpack::fsm::StateId;
use quadpack::model::{Slot, TestDate, TestMode, TestResult};
use quadpack::remote::reply::{self, RESULT_FRAME_LEN};

use crate::mock_hw::{Bench, Eeprom, Harness};

fn idle() -> Harness {
    Harness::new(TesterConfig::default(), Bench::healthy())
}

// ── Unloaded check ────────────────────────────────────────────

#[test]
fn unloaded_check_on_healthy_pack_replies_d() {
    let mut h = idle();
    h.send(b"u");
    h.tick();

    assert_eq!(h.replies(), b"d");
    assert!(h.app.result().unloaded.iter().all(|&v| (v - 3.2).abs() < 1e-3));
    assert!(!h.app.is_running());
    assert_eq!(h.hw.pulses, 0);
}

#[test]
fn unloaded_check_with_weak_cell_sends_voltages() {
    let mut h = Harness::new(
        TesterConfig::default(),
        Bench::with_cells([3.2, 3.2, 2.5, 3.2]),
    );
    h.send(b"u");
    h.tick();

    assert_eq!(h.replies(), b"v3.2003.2002.5003.200");
}

#[test]
fn unloaded_check_with_bad_connection_replies_e() {
    let mut bench = Bench::healthy();
    bench.pack_override = Some(25.0);
    let mut h = Harness::new(TesterConfig::default(), bench);
    h.send(b"u");
    h.tick();

    assert_eq!(h.replies(), b"e");
}

// ── Loaded tests ──────────────────────────────────────────────

#[test]
fn remote_manual_test_reports_target_then_completion() {
    let mut h = idle();
    h.send(b"m030");
    h.tick();
    assert!(h.app.is_running());
    assert!(h.sink.contains(&AppEvent::RunStarted {
        mode: TestMode::Manual,
        amps: 30,
        remote: true,
    }));

    h.hw.amps = 30.0;
    h.tick();
    assert_eq!(h.replies(), b"i");

    h.hw.amps = 0.0;
    h.tick();
    assert!(!h.app.is_running());
    assert_eq!(h.replies(), b"f");
    assert_eq!(h.app.result().max_load_current, 30);
    // The local menu never left its place.
    assert_eq!(h.app.state(), StateId::MainMenu);
}

#[test]
fn remote_manual_test_cancelled_from_host() {
    let mut h = idle();
    h.send(b"m030");
    h.tick();
    h.hw.amps = 10.0;
    h.tick();

    h.send(b"c");
    h.tick_until(5, |h| h.sink.contains(&AppEvent::RemoteCommand(AppCommand::Cancel)));
    for _ in 0..3 {
        h.tick();
    }
    assert!(h.app.is_running(), "knob still wound in");

    h.hw.amps = 0.5;
    h.tick();
    assert!(!h.app.is_running());
    assert_eq!(h.replies(), b"c");
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Cancelled)));
}

#[test]
fn remote_automated_test_then_result_frame() {
    let mut h = idle();
    h.send(b"a030");
    h.tick();
    h.finish_run();

    assert_eq!(h.replies(), b"a");
    assert!(h.hw.amps <= 1.0);
    let max = h.app.result().max_load_current;
    assert!((29..=30).contains(&max));

    h.send(b"r");
    h.tick();
    let frame = h.replies();
    assert_eq!(frame.len(), RESULT_FRAME_LEN);
    assert_eq!(frame[0], b'u');
    assert_eq!(frame[21], b'l');
    assert_eq!(frame[42], b'h');
    assert_eq!(frame[51], b'c');
    assert_eq!(&frame[52..], &reply::current_field(max));
}

#[test]
fn remote_automated_test_cancelled_from_host() {
    let mut bench = Bench::healthy();
    bench.amps_per_step = 0.01;
    let mut h = Harness::new(TesterConfig::default(), bench);

    h.send(b"a030");
    h.tick();
    for _ in 0..5 {
        h.tick();
    }
    assert!(h.hw.amps > 0.0);
    assert!(h.app.is_running());

    h.send(b"c");
    h.finish_run();

    let replies = h.replies();
    assert_eq!(replies, b"c");
    assert!(!replies.contains(&b'a'));
    assert!(h.hw.amps <= 1.0);
    assert!(!h.hw.awake);
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Cancelled)));
    assert_eq!(h.app.result().max_load_current, 0);
}

#[test]
fn buttons_and_host_commands_are_ignored_during_a_remote_run() {
    let mut h = idle();
    h.send(b"m030");
    h.tick();

    h.presses(&[Down, Ok]);
    assert_eq!(h.app.state(), StateId::MainMenu);
    assert_eq!(h.app.context().cursor, 1);

    h.send(b"u");
    h.tick();
    assert!(h.replies().is_empty());
    assert!(h.app.is_running());
}

// ── Stored results ────────────────────────────────────────────

#[test]
fn slot_request_sends_the_stored_record() {
    let record = TestResult {
        unloaded: [3.21, 3.20, 3.19, 3.22],
        loaded: [2.85, 2.61, 1.75, 2.95],
        max_load_current: 30,
        test_mode: TestMode::Manual,
        ambient_temp: 21,
        date: TestDate {
            year: 25,
            month: 5,
            day: 1,
        },
    };
    let slot = Slot::from_number(3).unwrap();
    let eeprom = Eeprom::blank().with_record(slot, &record);
    let mut h = Harness::with_eeprom(TesterConfig::default(), Bench::healthy(), eeprom);

    h.send(b"03");
    h.tick();

    assert_eq!(h.replies(), reply::encode_result(&record).as_slice());
    assert!(h.sink.contains(&AppEvent::ResultLoaded(slot)));
    assert_eq!(h.app.result().max_load_current, 0, "latest result untouched");
}

#[test]
fn out_of_range_slots_are_rejected_silently() {
    let mut h = idle();
    h.send(b"0014");
    h.tick();

    assert!(h.replies().is_empty());
    assert!(h.sink.contains(&AppEvent::RemoteRejected(ProtocolError::SlotOutOfRange(0))));
    assert!(h.sink.contains(&AppEvent::RemoteRejected(ProtocolError::SlotOutOfRange(14))));
}

#[test]
fn unknown_byte_gets_no_reply() {
    let mut h = idle();
    h.send(b"x");
    h.tick();

    assert!(h.replies().is_empty());
    assert!(h.sink.contains(&AppEvent::RemoteRejected(ProtocolError::UnknownCommand(b'x'))));
}
