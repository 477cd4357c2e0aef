//! Pure screen renderers.  Nothing here touches hardware; the service
//! hands the result to the [`DisplayPort`](crate::app::ports::DisplayPort).

use core::fmt;

use super::{ROWS, Screen};
use crate::config::VoltagePrecision;
use crate::control::{Phase, RunOutcome, TestRun};
use crate::error::TestFault;
use crate::fsm::StateId;
use crate::fsm::context::{FsmContext, HistoryState, ReviewState, SettingsState, TestState};
use crate::health::classify_result;
use crate::model::{CELL_COUNT, Slot, TestMode, TestResult};

// ── Menus ─────────────────────────────────────────────────────

const MAIN_MENU: [&str; 3] = ["Run Test", "View History", "Settings"];
const RESULT_MENU: [&str; 4] = [
    "Voltage Readings",
    "Health Ratings",
    "Test Conditions",
    "Discard Results",
];
const SETTINGS_MENU: [&str; 3] = ["Test Mode", "Load Current", "Voltage Precision"];

/// Render whatever the local interface is showing.
pub fn render(state: StateId, ctx: &FsmContext) -> Screen {
    match state {
        StateId::MainMenu => menu(&MAIN_MENU, ctx.cursor),
        StateId::Test => test_screen(ctx),
        StateId::ViewHistory => match ctx.history {
            HistoryState::SlotList => slot_list(ctx.slot_cursor),
            HistoryState::Review(r) => review(r, ctx, &ctx.viewed),
        },
        StateId::Settings => settings(ctx),
    }
}

fn menu(items: &[&str], cursor: u8) -> Screen {
    let mut s = Screen::blank();
    for (row, item) in items.iter().take(ROWS).enumerate() {
        s.put(row, item);
    }
    s.mark(usize::from(cursor.max(1)) - 1);
    s
}

/// Scrollable list of slots, four per page.
pub fn slot_list(cursor: Slot) -> Screen {
    let top = cursor.index() - cursor.index() % ROWS;
    let mut s = Screen::blank();
    for (row, slot) in Slot::all().skip(top).take(ROWS).enumerate() {
        s.write(row, format_args!("Quad Pack {}", slot.number()));
    }
    s.mark(cursor.index() - top);
    s
}

// ── Test lifecycle ────────────────────────────────────────────

fn test_screen(ctx: &FsmContext) -> Screen {
    match ctx.test {
        TestState::Error(fault) => error_screen(fault),
        TestState::Testing => match ctx.config.test_mode {
            TestMode::Automated => automated_in_progress(),
            TestMode::Manual => Screen::from_lines([
                "Rotate Knob Until",
                "Beeping Sound is",
                "Heard...",
                "",
            ]),
        },
        TestState::Review(r) => review(r, ctx, &ctx.result),
        TestState::SaveConfirm => Screen::from_lines([
            "Save Results?",
            "Press OK",
            "Otherwise Press BACK",
            "",
        ]),
        TestState::SlotPicker => slot_list(ctx.slot_cursor),
        TestState::OverwriteConfirm => Screen::from_lines([
            "Press OK to",
            "Overwrite Old Result",
            "Press BACK to",
            "View Current Result",
        ]),
    }
}

pub fn error_screen(fault: TestFault) -> Screen {
    match fault {
        TestFault::Connection => Screen::from_lines([
            "ERROR: Ensure",
            "Proper Connection",
            "Press OK or BACK",
            "to Continue",
        ]),
        TestFault::Safety => Screen::from_lines([
            "ERROR: Battery cell",
            "voltages are below",
            "minimum threshold",
            "for testing...",
        ]),
    }
}

fn automated_in_progress() -> Screen {
    Screen::from_lines(["Automated Test in", "Progress...", "Check Current meter", ""])
}

// ── Result review ─────────────────────────────────────────────

fn review(state: ReviewState, ctx: &FsmContext, result: &TestResult) -> Screen {
    match state {
        ReviewState::Menu => menu(&RESULT_MENU, ctx.cursor),
        ReviewState::Voltage => voltage_view(result, ctx.config.voltage_precision),
        ReviewState::Health => health_view(result),
        ReviewState::Conditions => conditions_view(result),
        ReviewState::Discard => Screen::from_lines([
            "Discard Results?",
            "Press OK to Discard",
            "",
            "",
        ]),
    }
}

/// Voltage with a fixed number of decimals; unreadable values show dashes.
struct Volts(f32, usize);

impl fmt::Display for Volts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() {
            write!(f, "{:.*}", self.1, self.0)
        } else {
            f.write_str("-----")
        }
    }
}

/// Unloaded (left) and loaded (right) voltage per cell.
pub fn voltage_view(result: &TestResult, precision: VoltagePrecision) -> Screen {
    let p = precision.decimals();
    let mut s = Screen::blank();
    for cell in 0..CELL_COUNT {
        let n = cell + 1;
        s.write(
            cell,
            format_args!(
                "B{n}: {}  B{n}: {}",
                Volts(result.unloaded[cell], p),
                Volts(result.loaded[cell], p)
            ),
        );
    }
    s
}

pub fn health_view(result: &TestResult) -> Screen {
    let mut s = Screen::blank();
    for (cell, grade) in classify_result(result).iter().enumerate() {
        s.write(cell, format_args!("B{}: {}", cell + 1, grade.code()));
    }
    s
}

pub fn conditions_view(result: &TestResult) -> Screen {
    let mut s = Screen::blank();
    s.write(0, format_args!("Load Current: {} A", result.max_load_current));
    s.write(1, format_args!("Mode: {}", result.test_mode.label()));
    s.write(2, format_args!("Amb Temp: {} C", result.ambient_temp));
    s.write(
        3,
        format_args!(
            "Date: 20{:02}/{}/{}",
            result.date.year, result.date.month, result.date.day
        ),
    );
    s
}

// ── Settings ──────────────────────────────────────────────────

fn settings(ctx: &FsmContext) -> Screen {
    match ctx.settings {
        SettingsState::List => menu(&SETTINGS_MENU, ctx.cursor),
        SettingsState::TestMode => {
            let mut s = Screen::from_lines(["Test Mode", "", "", "UP/DOWN to Change"]);
            s.write(2, format_args!("Mode: {}", ctx.config.test_mode.label()));
            s
        }
        SettingsState::LoadCurrent { digit, digits } => {
            let mut s = Screen::from_lines(["Load Current", "", "", ""]);
            s.write(
                2,
                format_args!("Current: {}{}{} A", digits[0], digits[1], digits[2]),
            );
            s.write(3, format_args!("{:>w$}", "^", w = 10 + usize::from(digit.min(2))));
            s
        }
        SettingsState::VoltagePrecision => {
            let mut s = Screen::from_lines(["Voltage Precision", "", "", "UP/DOWN to Change"]);
            s.write(
                2,
                format_args!("Decimals: {}", ctx.config.voltage_precision.decimals()),
            );
            s
        }
    }
}

// ── Live feedback while a run is active ───────────────────────

/// Progress screen for a running (or just finished) test.
pub fn run_progress(run: &TestRun) -> Screen {
    let amps = run.live_current();
    let mut s = match (run.spec().mode, run.phase()) {
        (_, Phase::Finished(RunOutcome::Cancelled)) => {
            Screen::from_lines(["Test Canceled...", "", "", ""])
        }
        (TestMode::Automated, Phase::Unloaded | Phase::Regulating) => {
            return automated_in_progress();
        }
        (_, Phase::Releasing | Phase::Cooldown(_) | Phase::Finished(RunOutcome::Completed))
            if run.spec().mode == TestMode::Automated =>
        {
            Screen::from_lines(["Automated Test is", "Complete...", "", ""])
        }
        (_, Phase::Aborting) => Screen::from_lines(["Test Canceled...", "Opening Load...", "", ""]),
        (_, Phase::ManualAbort) => Screen::from_lines([
            "Test Canceled...",
            "Rotate Knob Until",
            "Beeping Stops...",
            "",
        ]),
        (_, Phase::BackOff { .. } | Phase::Finished(RunOutcome::Completed)) => Screen::from_lines([
            "Test Complete...",
            "Rotate Knob Until",
            "Beeping Stops...",
            "",
        ]),
        _ => Screen::from_lines(["Rotate Knob Until", "Beeping Sound is", "Heard...", ""]),
    };
    let row = if s.line(2).trim().is_empty() { 2 } else { 3 };
    s.write(row, format_args!("Load Current: {amps:.1}A"));
    s
}
