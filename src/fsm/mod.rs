//! Function-pointer finite state machine engine for the local interface.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ StateId     │ on_enter  │ on_exit  │ on_input          │  │
//! │  ├─────────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ MainMenu    │ fn(ctx)   │    -     │ fn(ctx,in)->Opt<> │  │
//! │  │ Test        │ fn(ctx)   │    -     │ fn(ctx,in)->Opt<> │  │
//! │  │ ViewHistory │ fn(ctx)   │    -     │ fn(ctx,in)->Opt<> │  │
//! │  │ Settings    │ fn(ctx)   │ fn(ctx)  │ fn(ctx,in)->Opt<> │  │
//! │  └─────────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine is driven by inputs rather than time: button presses, the
//! safety gate verdict, and the end of a test run.  For each input the
//! engine calls `on_input` for the **current** state.  If it returns
//! `Some(next_id)`, the engine runs `on_exit` for the current state, then
//! `on_enter` for the next, and updates the current pointer.  All
//! functions receive `&mut FsmContext`, which carries the nested lifecycle
//! state of the active top-level state.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::control::RunOutcome;
use crate::events::ButtonPress;
use crate::safety::Verdict;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Top-level local-interface states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    MainMenu = 0,
    Test = 1,
    ViewHistory = 2,
    Settings = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `MainMenu` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::MainMenu,
            1 => Self::Test,
            2 => Self::ViewHistory,
            3 => Self::Settings,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::MainMenu
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything that can move the local interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Button(ButtonPress),
    /// Answer to `Request::CheckReadiness`.
    Readiness(Verdict),
    /// A run started by `Request::StartRun` ended.
    RunFinished(RunOutcome),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the input handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateInputFn = fn(&mut FsmContext, Input) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_input: StateInputFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one input to the current state.
    pub fn handle(&mut self, input: Input, ctx: &mut FsmContext) {
        if let Some(next) = (self.table[self.current].on_input)(ctx, input) {
            if next as usize != self.current {
                self.transition(next, ctx);
            }
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{FsmContext, HistoryState, Request, ReviewState, SettingsState, TestState};
    use super::*;
    use crate::config::{TesterConfig, VoltagePrecision};
    use crate::error::TestFault;
    use crate::model::{Slot, TestMode, TestResult};
    use ButtonPress::{Back, Down, Ok, Up};

    fn make() -> (Fsm, FsmContext) {
        let mut fsm = Fsm::new(states::build_state_table(), StateId::MainMenu);
        let mut ctx = FsmContext::new(TesterConfig::default());
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    fn press(fsm: &mut Fsm, ctx: &mut FsmContext, buttons: &[ButtonPress]) {
        for &b in buttons {
            fsm.handle(Input::Button(b), ctx);
        }
    }

    /// Main menu → run test → gate passes → run completes.
    fn completed_test() -> (Fsm, FsmContext) {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Ok]);
        fsm.handle(Input::Readiness(Verdict::Testing), &mut ctx);
        ctx.take_requests();
        fsm.handle(Input::RunFinished(RunOutcome::Completed), &mut ctx);
        (fsm, ctx)
    }

    #[test]
    fn starts_in_main_menu() {
        let (fsm, ctx) = make();
        assert_eq!(fsm.current_state(), StateId::MainMenu);
        assert_eq!(ctx.cursor, 1);
    }

    #[test]
    fn main_menu_cursor_clamps_to_three() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Up, Down, Down, Down, Down]);
        assert_eq!(ctx.cursor, 3);
    }

    #[test]
    fn run_test_asks_for_readiness_first() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Ok]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
        assert_eq!(ctx.take_requests().as_slice(), &[Request::CheckReadiness]);
    }

    #[test]
    fn passing_gate_enters_testing_and_starts_run() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Ok]);
        ctx.take_requests();
        fsm.handle(Input::Readiness(Verdict::Testing), &mut ctx);
        assert_eq!(fsm.current_state(), StateId::Test);
        assert_eq!(ctx.test, TestState::Testing);
        assert_eq!(ctx.take_requests().as_slice(), &[Request::StartRun]);
    }

    #[test]
    fn error_is_dismissed_by_ok_or_back_only() {
        for dismiss in [Ok, Back] {
            let (mut fsm, mut ctx) = make();
            fsm.handle(Input::Readiness(Verdict::Error(TestFault::Safety)), &mut ctx);
            assert_eq!(ctx.test, TestState::Error(TestFault::Safety));
            assert!(ctx.take_requests().is_empty());

            press(&mut fsm, &mut ctx, &[Up, Down]);
            assert_eq!(fsm.current_state(), StateId::Test);

            press(&mut fsm, &mut ctx, &[dismiss]);
            assert_eq!(fsm.current_state(), StateId::MainMenu);
            assert_eq!(ctx.cursor, 1);
        }
    }

    #[test]
    fn back_while_testing_requests_cancel() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Ok]);
        fsm.handle(Input::Readiness(Verdict::Testing), &mut ctx);
        ctx.take_requests();
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(ctx.take_requests().as_slice(), &[Request::CancelRun]);
        fsm.handle(Input::RunFinished(RunOutcome::Cancelled), &mut ctx);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
    }

    #[test]
    fn completed_run_opens_result_menu() {
        let (fsm, ctx) = completed_test();
        assert_eq!(fsm.current_state(), StateId::Test);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Menu));
        assert_eq!(ctx.cursor, 1);
    }

    #[test]
    fn result_menu_views_return_on_back() {
        let (mut fsm, mut ctx) = completed_test();
        press(&mut fsm, &mut ctx, &[Down, Ok]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Health));
        press(&mut fsm, &mut ctx, &[Up, Down, Ok]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Health));
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Menu));
    }

    #[test]
    fn discard_only_accepts_ok() {
        let (mut fsm, mut ctx) = completed_test();
        ctx.result.max_load_current = 30;
        press(&mut fsm, &mut ctx, &[Down, Down, Down, Down, Ok]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Discard));
        press(&mut fsm, &mut ctx, &[Back, Up]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Discard));
        press(&mut fsm, &mut ctx, &[Ok]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
        assert_eq!(ctx.result, TestResult::default());
        assert!(ctx.take_requests().is_empty());
    }

    #[test]
    fn save_flow_writes_chosen_slot() {
        let (mut fsm, mut ctx) = completed_test();
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(ctx.test, TestState::SaveConfirm);
        press(&mut fsm, &mut ctx, &[Ok]);
        assert_eq!(ctx.test, TestState::SlotPicker);
        assert_eq!(ctx.slot_cursor, Slot::FIRST);
        press(&mut fsm, &mut ctx, &[Down, Down, Ok]);
        assert_eq!(ctx.test, TestState::OverwriteConfirm);
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(ctx.test, TestState::SlotPicker);
        press(&mut fsm, &mut ctx, &[Ok, Ok]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
        assert_eq!(
            ctx.take_requests().as_slice(),
            &[Request::Save(Slot::from_number(3).unwrap())]
        );
    }

    #[test]
    fn save_confirm_back_returns_to_result_menu() {
        let (mut fsm, mut ctx) = completed_test();
        press(&mut fsm, &mut ctx, &[Back, Back]);
        assert_eq!(ctx.test, TestState::Review(ReviewState::Menu));
    }

    #[test]
    fn history_review_back_returns_to_list() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Ok]);
        assert_eq!(fsm.current_state(), StateId::ViewHistory);
        press(&mut fsm, &mut ctx, &[Down, Ok]);
        assert_eq!(
            ctx.take_requests().as_slice(),
            &[Request::Load(Slot::from_number(2).unwrap())]
        );
        assert_eq!(ctx.history, HistoryState::Review(ReviewState::Menu));
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(ctx.history, HistoryState::SlotList);
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
    }

    #[test]
    fn history_discard_erases_slot() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Ok, Down, Down, Ok]);
        ctx.take_requests();
        press(&mut fsm, &mut ctx, &[Down, Down, Down, Ok, Ok]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
        assert_eq!(
            ctx.take_requests().as_slice(),
            &[Request::Erase(Slot::from_number(3).unwrap())]
        );
    }

    #[test]
    fn settings_toggle_mode_and_precision() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Down, Ok]);
        assert_eq!(fsm.current_state(), StateId::Settings);
        press(&mut fsm, &mut ctx, &[Ok, Up, Back]);
        assert_eq!(ctx.config.test_mode, TestMode::Manual);
        press(&mut fsm, &mut ctx, &[Down, Down, Ok, Down, Ok]);
        assert_eq!(ctx.config.voltage_precision, VoltagePrecision::Low);
        assert_eq!(ctx.settings, SettingsState::List);
        assert!(ctx.config_dirty);
        press(&mut fsm, &mut ctx, &[Back]);
        assert_eq!(fsm.current_state(), StateId::MainMenu);
    }

    #[test]
    fn load_current_editor_commits_on_last_digit() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Down, Ok, Down, Ok]);
        assert_eq!(
            ctx.settings,
            SettingsState::LoadCurrent { digit: 0, digits: [0, 3, 0] }
        );
        // 030 → 145
        press(&mut fsm, &mut ctx, &[Up, Ok, Up, Ok, Up, Up, Up, Up, Up]);
        assert_eq!(
            ctx.settings,
            SettingsState::LoadCurrent { digit: 2, digits: [1, 4, 5] }
        );
        press(&mut fsm, &mut ctx, &[Ok]);
        assert_eq!(ctx.settings, SettingsState::List);
        assert_eq!(ctx.config.load_current_amps, 145);
        assert!(ctx.config_dirty);
    }

    #[test]
    fn load_current_digits_wrap() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Down, Ok, Down, Ok, Down]);
        assert_eq!(
            ctx.settings,
            SettingsState::LoadCurrent { digit: 0, digits: [9, 3, 0] }
        );
    }

    #[test]
    fn zero_load_current_is_rejected() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Down, Ok, Down, Ok]);
        // 030 → 000
        press(&mut fsm, &mut ctx, &[Ok, Down, Down, Down, Ok, Ok]);
        assert_eq!(ctx.settings, SettingsState::List);
        assert_eq!(ctx.config.load_current_amps, 30);
        assert!(!ctx.config_dirty);
    }

    #[test]
    fn back_abandons_load_current_edit() {
        let (mut fsm, mut ctx) = make();
        press(&mut fsm, &mut ctx, &[Down, Down, Ok, Down, Ok, Up, Back]);
        assert_eq!(ctx.settings, SettingsState::List);
        assert_eq!(ctx.config.load_current_amps, 30);
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            assert_eq!(StateId::from_index(i) as usize, i);
        }
    }
}
