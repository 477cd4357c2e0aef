//! Local (button-driven) flows through the full application service.

use quadpack::app::commands::AppCommand;
use quadpack::app::events::AppEvent;
use quadpack::config::TesterConfig;
use quadpack::control::RunOutcome;
use quadpack::error::{StorageError, StoreError};
use quadpack::events::ButtonPress::{Back, Down, Ok, Up};
use quadpack::fsm::StateId;
use quadpack::fsm::context::{HistoryState, ReviewState, SettingsState, TestState};
use quadpack::model::{Slot, TestDate, TestMode, TestResult};

use crate::mock_hw::{Bench, Eeprom, Harness, MemConfig};

fn manual() -> TesterConfig {
    TesterConfig {
        test_mode: TestMode::Manual,
        ..Default::default()
    }
}

fn sample_record() -> TestResult {
    TestResult {
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
    }
}

// ── Automated test ────────────────────────────────────────────

#[test]
fn automated_test_regulates_records_and_opens_the_load() {
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());
    assert!(h.hw.shows("Run Test"));

    h.press(Ok);
    assert_eq!(h.app.state(), StateId::Test);
    assert!(h.app.is_running());
    assert!(h.sink.contains(&AppEvent::RunStarted {
        mode: TestMode::Automated,
        amps: 30,
        remote: false,
    }));

    h.finish_run();

    let r = *h.app.result();
    assert!(r.unloaded.iter().all(|&v| (v - 3.2).abs() < 1e-3));
    assert!(r.loaded.iter().all(|&v| v < 3.2 && v > 2.8));
    assert_eq!(r.max_load_current, 29);
    assert_eq!(r.test_mode, TestMode::Automated);
    assert_eq!(r.ambient_temp, 23);
    assert_eq!(r.date, h.hw.date);

    assert!(h.hw.amps <= 1.0, "load left at {} A", h.hw.amps);
    assert!(!h.hw.awake);
    assert_eq!(h.hw.buzzer_edges, vec![true, false]);
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Completed)));
    assert_eq!(h.app.context().test, TestState::Review(ReviewState::Menu));
}

#[test]
fn completed_result_is_saved_to_the_chosen_slot() {
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());
    h.press(Ok);
    h.finish_run();

    // Result menu -> Save? -> slot picker -> slot 2 -> overwrite? -> OK
    h.presses(&[Back, Ok, Down, Ok]);
    assert_eq!(h.app.context().test, TestState::OverwriteConfirm);
    h.press(Ok);

    let slot = Slot::from_number(2).unwrap();
    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.sink.contains(&AppEvent::ResultSaved(slot)));
    assert_eq!(h.app.store().load(slot).unwrap(), *h.app.result());
    assert_eq!(h.app.store().storage().writes, 1);
}

#[test]
fn back_from_save_prompt_returns_to_result_menu() {
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());
    h.press(Ok);
    h.finish_run();

    h.presses(&[Back, Back]);
    assert_eq!(h.app.context().test, TestState::Review(ReviewState::Menu));
    assert_eq!(h.app.store().storage().writes, 0);
}

#[test]
fn store_failure_is_reported_and_menu_still_returns() {
    let eeprom = Eeprom {
        fail_writes: true,
        ..Eeprom::blank()
    };
    let mut h = Harness::with_eeprom(TesterConfig::default(), Bench::healthy(), eeprom);
    h.press(Ok);
    h.finish_run();
    h.presses(&[Back, Ok, Ok, Ok]);

    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.sink.contains(&AppEvent::StoreFailed(StoreError::Storage(StorageError::Io))));
}

#[test]
fn cancelling_automated_test_opens_load_and_keeps_no_loaded_data() {
    let mut bench = Bench::healthy();
    bench.amps_per_step = 0.01;
    let mut h = Harness::new(TesterConfig::default(), bench);

    h.press(Ok);
    for _ in 0..3 {
        h.tick();
    }
    assert!(h.hw.amps > 0.0);

    h.press(Back);
    assert!(h.cancel.is_requested());
    h.finish_run();

    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Cancelled)));
    assert!(h.hw.amps <= 1.0);
    assert!(!h.hw.awake);
    assert_eq!(h.app.result().loaded, [0.0; 4]);
    assert_eq!(h.app.result().max_load_current, 0);
    assert!(!h.cancel.is_requested());
}

#[test]
fn host_cancel_byte_stops_a_local_automated_test() {
    let mut bench = Bench::healthy();
    bench.amps_per_step = 0.01;
    let mut h = Harness::new(TesterConfig::default(), bench);

    h.press(Ok);
    for _ in 0..3 {
        h.tick();
    }
    assert!(h.hw.amps > 0.0);

    h.send(b"c");
    h.finish_run();

    assert!(h.sink.contains(&AppEvent::RemoteCommand(AppCommand::Cancel)));
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Cancelled)));
    assert!(h.hw.amps <= 1.0);
    assert!(!h.hw.awake);
    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.replies().is_empty(), "a local run answers nothing to the host");
}

#[test]
fn other_host_commands_are_dropped_during_a_local_test() {
    let mut bench = Bench::healthy();
    bench.amps_per_step = 0.01;
    let mut h = Harness::new(TesterConfig::default(), bench);

    h.press(Ok);
    h.tick();
    h.send(b"ur");
    h.tick();
    h.tick();

    assert!(h.app.is_running());
    assert!(h.replies().is_empty());
}

// ── Manual test ───────────────────────────────────────────────

#[test]
fn manual_test_samples_at_target_then_beeps_until_released() {
    let mut h = Harness::new(manual(), Bench::healthy());
    h.press(Ok);
    h.tick(); // unloaded sample
    assert!(h.hw.shows("Rotate Knob Until"));

    // Operator winds the knob up 4 A per tick.
    for _ in 0..10 {
        h.hw.amps += 4.0;
        h.tick();
    }
    assert!(h.sink.contains(&AppEvent::TargetReached(32.0)));
    assert!(h.app.is_running());
    assert!(h.hw.buzzer);
    assert!(h.hw.shows("Beeping Stops"));

    h.hw.amps = 0.0;
    h.tick();

    assert!(!h.app.is_running());
    assert!(!h.hw.buzzer);
    assert_eq!(h.hw.pulses, 0, "manual mode never moves the stepper");
    let r = h.app.result();
    assert_eq!(r.max_load_current, 32);
    assert_eq!(r.test_mode, TestMode::Manual);
    assert_eq!(h.app.context().test, TestState::Review(ReviewState::Menu));
}

#[test]
fn cancelled_manual_test_waits_for_knob_to_return() {
    let mut h = Harness::new(manual(), Bench::healthy());
    h.press(Ok);
    h.tick();
    h.hw.amps = 12.0;
    h.tick();

    h.press(Back);
    for _ in 0..5 {
        h.tick();
    }
    assert!(h.app.is_running(), "load still closed, run must wait");
    assert!(h.hw.shows("Test Canceled"));

    h.hw.amps = 0.5;
    h.tick();
    assert!(!h.app.is_running());
    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.sink.contains(&AppEvent::RunFinished(RunOutcome::Cancelled)));
}

// ── Safety gate ───────────────────────────────────────────────

#[test]
fn weak_cell_refuses_test_without_loading() {
    let mut h = Harness::new(TesterConfig::default(), Bench::with_cells([3.2, 3.2, 2.5, 3.2]));
    h.press(Ok);

    assert_eq!(h.app.state(), StateId::Test);
    assert!(!h.app.is_running());
    assert!(h.hw.shows("minimum threshold"));
    assert_eq!(h.hw.pulses, 0);

    h.press(Ok);
    assert_eq!(h.app.state(), StateId::MainMenu);
}

#[test]
fn implausible_pack_voltage_is_a_connection_error() {
    let mut bench = Bench::healthy();
    bench.pack_override = Some(25.0);
    let mut h = Harness::new(TesterConfig::default(), bench);
    h.press(Ok);

    assert!(h.hw.shows("Proper Connection"));
    assert!(!h.app.is_running());
    h.press(Back);
    assert_eq!(h.app.state(), StateId::MainMenu);
}

#[test]
fn error_screen_ignores_arrow_keys() {
    let mut h = Harness::new(TesterConfig::default(), Bench::with_cells([2.0; 4]));
    h.press(Ok);
    h.presses(&[Up, Down]);
    assert_eq!(h.app.state(), StateId::Test);
}

// ── History ───────────────────────────────────────────────────

#[test]
fn history_loads_and_discards_a_slot() {
    let slot = Slot::from_number(3).unwrap();
    let eeprom = Eeprom::blank().with_record(slot, &sample_record());
    let mut h = Harness::with_eeprom(TesterConfig::default(), Bench::healthy(), eeprom);

    h.presses(&[Down, Ok]);
    assert_eq!(h.app.state(), StateId::ViewHistory);
    h.presses(&[Down, Down, Ok]);
    assert_eq!(h.app.context().viewed, sample_record());
    assert!(h.sink.contains(&AppEvent::ResultLoaded(slot)));

    // Voltage view and back.
    h.presses(&[Ok]);
    assert!(h.hw.shows("3.210"));
    h.press(Back);

    // Discard accepts only OK.
    h.presses(&[Down, Down, Down, Ok]);
    assert!(h.hw.shows("Discard Results?"));
    h.press(Back);
    assert_eq!(h.app.context().history, HistoryState::Review(ReviewState::Discard));
    h.press(Ok);

    assert_eq!(h.app.state(), StateId::MainMenu);
    assert!(h.sink.contains(&AppEvent::ResultErased(slot)));
    assert!(h.app.store().storage().record_bytes(slot).iter().all(|&b| b == 0xFF));
}

#[test]
fn history_back_returns_to_slot_list_then_menu() {
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());
    h.presses(&[Down, Ok, Ok]);
    h.press(Back);
    assert_eq!(h.app.context().history, HistoryState::SlotList);
    h.press(Back);
    assert_eq!(h.app.state(), StateId::MainMenu);
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn settings_persist_after_leaving_the_menu() {
    let nvs = MemConfig::default();
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());

    h.presses(&[Down, Down, Ok]);
    assert_eq!(h.app.state(), StateId::Settings);
    h.presses(&[Ok, Up, Back]);
    assert_eq!(h.app.config().test_mode, TestMode::Manual);
    assert!(!h.app.save_config_if_dirty(&nvs, &mut h.sink));

    h.press(Back);
    assert!(h.app.save_config_if_dirty(&nvs, &mut h.sink));
    assert!(!h.app.is_config_dirty());
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.saved.borrow().as_ref().unwrap().test_mode, TestMode::Manual);
    assert!(h.sink.contains(&AppEvent::ConfigSaved));
}

#[test]
fn load_current_is_edited_digit_by_digit() {
    let mut h = Harness::new(TesterConfig::default(), Bench::healthy());
    h.presses(&[Down, Down, Ok, Down, Ok]);
    assert_eq!(
        h.app.context().settings,
        SettingsState::LoadCurrent {
            digit: 0,
            digits: [0, 3, 0]
        }
    );

    h.presses(&[Up, Ok, Ok, Down, Ok]);
    assert_eq!(h.app.config().load_current_amps, 139);
    assert_eq!(h.app.context().settings, SettingsState::List);

    // The next local test targets the edited current.
    h.presses(&[Back, Up, Up, Ok]);
    assert!(h.sink.contains(&AppEvent::RunStarted {
        mode: TestMode::Automated,
        amps: 139,
        remote: false,
    }));
}
