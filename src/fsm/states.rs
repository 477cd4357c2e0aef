//! Concrete state handler functions and table builder.
//!
//! Each top-level state is three plain `fn` pointers.  The nested
//! lifecycle (test, history review, settings) lives in [`FsmContext`] and
//! is advanced by the top-level handler.
//!
//! ```text
//!  MAIN MENU ──[OK Run Test]──▶ (readiness) ──▶ TEST
//!      ▲                                          │ Error ─[OK/BACK]─┐
//!      │                                          │ Testing          │
//!      │                                          │   ▼              │
//!      │                                          │ Review ⇄ views   │
//!      │                                          │   ▼ BACK         │
//!      │                                          │ SaveConfirm      │
//!      │                                          │   ▼ OK           │
//!      │                                          │ SlotPicker       │
//!      │                                          │   ▼ OK           │
//!      │                                          │ OverwriteConfirm │
//!      ├──────────────────────────────────────────┴──────────────────┘
//!      ├──[OK View History]──▶ VIEW HISTORY (SlotList ⇄ Review)
//!      └──[OK Settings]──────▶ SETTINGS (List ⇄ editors)
//! ```

use log::{info, warn};

use super::context::{
    FsmContext, HistoryState, MAIN_MENU_ITEMS, RESULT_MENU_ITEMS, Request, ReviewState,
    SETTINGS_ITEMS, SettingsState, TestState,
};
use super::{Input, StateDescriptor, StateId};
use crate::control::RunOutcome;
use crate::events::ButtonPress;
use crate::model::TestResult;
use crate::safety::Verdict;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: MainMenu
        StateDescriptor {
            id: StateId::MainMenu,
            name: "MainMenu",
            on_enter: Some(main_menu_enter),
            on_exit: None,
            on_input: main_menu_input,
        },
        // Index 1: Test
        StateDescriptor {
            id: StateId::Test,
            name: "Test",
            on_enter: Some(test_enter),
            on_exit: None,
            on_input: test_input,
        },
        // Index 2: ViewHistory
        StateDescriptor {
            id: StateId::ViewHistory,
            name: "ViewHistory",
            on_enter: Some(history_enter),
            on_exit: None,
            on_input: history_input,
        },
        // Index 3: Settings
        StateDescriptor {
            id: StateId::Settings,
            name: "Settings",
            on_enter: Some(settings_enter),
            on_exit: Some(settings_exit),
            on_input: settings_input,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  MAIN MENU
// ═══════════════════════════════════════════════════════════════════════════

fn main_menu_enter(ctx: &mut FsmContext) {
    ctx.cursor = 1;
    ctx.slot_cursor = crate::model::Slot::FIRST;
}

fn main_menu_input(ctx: &mut FsmContext, input: Input) -> Option<StateId> {
    match input {
        Input::Button(ButtonPress::Up) => ctx.cursor_up(),
        Input::Button(ButtonPress::Down) => ctx.cursor_down(MAIN_MENU_ITEMS),
        Input::Button(ButtonPress::Ok) => {
            return match ctx.cursor {
                1 => {
                    ctx.request(Request::CheckReadiness);
                    None
                }
                2 => Some(StateId::ViewHistory),
                _ => Some(StateId::Settings),
            };
        }
        Input::Button(ButtonPress::Back) => {}
        Input::Readiness(Verdict::Testing) => {
            ctx.test = TestState::Testing;
            return Some(StateId::Test);
        }
        Input::Readiness(Verdict::Error(fault)) => {
            ctx.test = TestState::Error(fault);
            return Some(StateId::Test);
        }
        Input::RunFinished(_) => {}
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Result review (shared by TEST and VIEW HISTORY)
// ═══════════════════════════════════════════════════════════════════════════

enum ReviewStep {
    Stay(ReviewState),
    /// BACK from the result menu; the caller decides where that leads.
    Leave,
    /// Discard confirmed.
    Discard,
}

fn review_step(ctx: &mut FsmContext, state: ReviewState, press: ButtonPress) -> ReviewStep {
    match state {
        ReviewState::Menu => match press {
            ButtonPress::Up => {
                ctx.cursor_up();
                ReviewStep::Stay(ReviewState::Menu)
            }
            ButtonPress::Down => {
                ctx.cursor_down(RESULT_MENU_ITEMS);
                ReviewStep::Stay(ReviewState::Menu)
            }
            ButtonPress::Ok => ReviewStep::Stay(match ctx.cursor {
                1 => ReviewState::Voltage,
                2 => ReviewState::Health,
                3 => ReviewState::Conditions,
                _ => ReviewState::Discard,
            }),
            ButtonPress::Back => ReviewStep::Leave,
        },
        ReviewState::Voltage | ReviewState::Health | ReviewState::Conditions => {
            if press == ButtonPress::Back {
                ReviewStep::Stay(ReviewState::Menu)
            } else {
                ReviewStep::Stay(state)
            }
        }
        ReviewState::Discard => {
            if press == ButtonPress::Ok {
                ReviewStep::Discard
            } else {
                ReviewStep::Stay(state)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TEST
// ═══════════════════════════════════════════════════════════════════════════

fn test_enter(ctx: &mut FsmContext) {
    match ctx.test {
        TestState::Testing => {
            ctx.result = TestResult::default();
            ctx.request(Request::StartRun);
            info!("TEST: safety gate passed, starting run");
        }
        TestState::Error(fault) => warn!("TEST: refused ({fault})"),
        _ => {}
    }
}

fn test_input(ctx: &mut FsmContext, input: Input) -> Option<StateId> {
    let press = match (ctx.test, input) {
        (TestState::Testing, Input::RunFinished(RunOutcome::Completed)) => {
            ctx.cursor = 1;
            ctx.test = TestState::Review(ReviewState::Menu);
            return None;
        }
        (TestState::Testing, Input::RunFinished(RunOutcome::Cancelled)) => {
            return Some(StateId::MainMenu);
        }
        (_, Input::Button(press)) => press,
        _ => return None,
    };

    match ctx.test {
        TestState::Error(_) => {
            if matches!(press, ButtonPress::Ok | ButtonPress::Back) {
                return Some(StateId::MainMenu);
            }
        }
        TestState::Testing => {
            if press == ButtonPress::Back {
                ctx.request(Request::CancelRun);
            }
        }
        TestState::Review(review) => match review_step(ctx, review, press) {
            ReviewStep::Stay(next) => ctx.test = TestState::Review(next),
            ReviewStep::Leave => ctx.test = TestState::SaveConfirm,
            ReviewStep::Discard => {
                info!("TEST: result discarded");
                ctx.result = TestResult::default();
                return Some(StateId::MainMenu);
            }
        },
        TestState::SaveConfirm => match press {
            ButtonPress::Ok => {
                ctx.slot_cursor = crate::model::Slot::FIRST;
                ctx.test = TestState::SlotPicker;
            }
            ButtonPress::Back => {
                ctx.cursor = 1;
                ctx.test = TestState::Review(ReviewState::Menu);
            }
            _ => {}
        },
        TestState::SlotPicker => match press {
            ButtonPress::Up => ctx.slot_cursor = ctx.slot_cursor.prev(),
            ButtonPress::Down => ctx.slot_cursor = ctx.slot_cursor.next(),
            ButtonPress::Ok => ctx.test = TestState::OverwriteConfirm,
            ButtonPress::Back => ctx.test = TestState::SaveConfirm,
        },
        TestState::OverwriteConfirm => match press {
            ButtonPress::Ok => {
                ctx.request(Request::Save(ctx.slot_cursor));
                return Some(StateId::MainMenu);
            }
            ButtonPress::Back => ctx.test = TestState::SlotPicker,
            _ => {}
        },
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  VIEW HISTORY
// ═══════════════════════════════════════════════════════════════════════════

fn history_enter(ctx: &mut FsmContext) {
    ctx.history = HistoryState::SlotList;
    ctx.slot_cursor = crate::model::Slot::FIRST;
}

fn history_input(ctx: &mut FsmContext, input: Input) -> Option<StateId> {
    let Input::Button(press) = input else {
        return None;
    };

    match ctx.history {
        HistoryState::SlotList => match press {
            ButtonPress::Up => ctx.slot_cursor = ctx.slot_cursor.prev(),
            ButtonPress::Down => ctx.slot_cursor = ctx.slot_cursor.next(),
            ButtonPress::Ok => {
                ctx.request(Request::Load(ctx.slot_cursor));
                ctx.cursor = 1;
                ctx.history = HistoryState::Review(ReviewState::Menu);
            }
            ButtonPress::Back => return Some(StateId::MainMenu),
        },
        HistoryState::Review(review) => match review_step(ctx, review, press) {
            ReviewStep::Stay(next) => ctx.history = HistoryState::Review(next),
            ReviewStep::Leave => ctx.history = HistoryState::SlotList,
            ReviewStep::Discard => {
                ctx.request(Request::Erase(ctx.slot_cursor));
                ctx.viewed = TestResult::default();
                return Some(StateId::MainMenu);
            }
        },
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SETTINGS
// ═══════════════════════════════════════════════════════════════════════════

fn settings_enter(ctx: &mut FsmContext) {
    ctx.cursor = 1;
    ctx.settings = SettingsState::List;
}

fn settings_exit(ctx: &mut FsmContext) {
    if ctx.config_dirty {
        info!(
            "SETTINGS: mode={}, load={} A, precision={:?}",
            ctx.config.test_mode.label(),
            ctx.config.load_current_amps,
            ctx.config.voltage_precision
        );
    }
}

fn split_digits(amps: u16) -> [u8; 3] {
    let amps = amps.min(999);
    [(amps / 100) as u8, (amps / 10 % 10) as u8, (amps % 10) as u8]
}

fn settings_input(ctx: &mut FsmContext, input: Input) -> Option<StateId> {
    let Input::Button(press) = input else {
        return None;
    };

    match ctx.settings {
        SettingsState::List => match press {
            ButtonPress::Up => ctx.cursor_up(),
            ButtonPress::Down => ctx.cursor_down(SETTINGS_ITEMS),
            ButtonPress::Ok => {
                ctx.settings = match ctx.cursor {
                    1 => SettingsState::TestMode,
                    2 => SettingsState::LoadCurrent {
                        digit: 0,
                        digits: split_digits(ctx.config.load_current_amps),
                    },
                    _ => SettingsState::VoltagePrecision,
                };
            }
            ButtonPress::Back => return Some(StateId::MainMenu),
        },

        SettingsState::TestMode => match press {
            ButtonPress::Up | ButtonPress::Down => {
                ctx.config.test_mode = ctx.config.test_mode.toggled();
                ctx.config_dirty = true;
            }
            ButtonPress::Ok | ButtonPress::Back => ctx.settings = SettingsState::List,
        },

        SettingsState::VoltagePrecision => match press {
            ButtonPress::Up | ButtonPress::Down => {
                ctx.config.voltage_precision = ctx.config.voltage_precision.toggled();
                ctx.config_dirty = true;
            }
            ButtonPress::Ok | ButtonPress::Back => ctx.settings = SettingsState::List,
        },

        SettingsState::LoadCurrent { digit, mut digits } => {
            let d = usize::from(digit.min(2));
            match press {
                ButtonPress::Up => {
                    digits[d] = (digits[d] + 1) % 10;
                    ctx.settings = SettingsState::LoadCurrent { digit, digits };
                }
                ButtonPress::Down => {
                    digits[d] = (digits[d] + 9) % 10;
                    ctx.settings = SettingsState::LoadCurrent { digit, digits };
                }
                ButtonPress::Ok if digit < 2 => {
                    ctx.settings = SettingsState::LoadCurrent {
                        digit: digit + 1,
                        digits,
                    };
                }
                ButtonPress::Ok => {
                    let amps = u16::from(digits[0]) * 100
                        + u16::from(digits[1]) * 10
                        + u16::from(digits[2]);
                    if amps == 0 {
                        warn!("SETTINGS: load current must be at least 1 A");
                    } else if amps != ctx.config.load_current_amps {
                        ctx.config.load_current_amps = amps;
                        ctx.config_dirty = true;
                    }
                    ctx.settings = SettingsState::List;
                }
                ButtonPress::Back => ctx.settings = SettingsState::List,
            }
        }
    }
    None
}
