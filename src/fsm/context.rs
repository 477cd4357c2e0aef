//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the nested lifecycle state of whichever top-level
//! state is active, the menu cursors, the in-memory test result and the
//! requests handlers leave for the service to carry out.  Think of it as
//! the "blackboard" in a blackboard architecture.

use heapless::Vec;
use log::warn;

use crate::config::TesterConfig;
use crate::error::TestFault;
use crate::model::{Slot, TestResult};

/// Main menu entries.
pub const MAIN_MENU_ITEMS: u8 = 3;
/// Result menu entries (Voltage / Health / Conditions / Discard).
pub const RESULT_MENU_ITEMS: u8 = 4;
/// Settings list entries.
pub const SETTINGS_ITEMS: u8 = 3;

// ---------------------------------------------------------------------------
// Nested lifecycle states
// ---------------------------------------------------------------------------

/// Result review screens shared by a fresh test and history review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Menu,
    Voltage,
    Health,
    Conditions,
    Discard,
}

/// Lifecycle of a local test.  Only meaningful while the top-level state
/// is [`StateId::Test`](super::StateId::Test).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    Error(TestFault),
    Testing,
    Review(ReviewState),
    SaveConfirm,
    SlotPicker,
    OverwriteConfirm,
}

/// Lifecycle of history review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    SlotList,
    Review(ReviewState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsState {
    List,
    TestMode,
    /// Three-digit editor; `digit` 0 is hundreds.
    LoadCurrent { digit: u8, digits: [u8; 3] },
    VoltagePrecision,
}

// ---------------------------------------------------------------------------
// Requests (written by handlers; carried out by the service)
// ---------------------------------------------------------------------------

/// Side effects a handler cannot perform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Run the safety gate and report back with `Input::Readiness`.
    CheckReadiness,
    /// Start a loaded test on the in-memory result.
    StartRun,
    /// Stop the running test.
    CancelRun,
    /// Write the in-memory result to a slot.
    Save(Slot),
    /// Read a slot into the history view.
    Load(Slot),
    /// Return a slot to the erased pattern.
    Erase(Slot),
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Configuration --
    pub config: TesterConfig,
    /// Set when a settings edit changed `config`; cleared once persisted.
    pub config_dirty: bool,

    // -- Navigation --
    /// One-based cursor of whichever list is on screen.
    pub cursor: u8,
    /// Slot under the cursor in the history list and slot picker.
    pub slot_cursor: Slot,

    // -- Lifecycle --
    pub test: TestState,
    pub history: HistoryState,
    pub settings: SettingsState,

    // -- Data --
    /// The in-memory result of the latest test (also read by the host).
    pub result: TestResult,
    /// Record loaded from the store for history review.
    pub viewed: TestResult,

    // -- Outputs --
    pub requests: Vec<Request, 4>,
}

impl FsmContext {
    pub fn new(config: TesterConfig) -> Self {
        Self {
            config,
            config_dirty: false,
            cursor: 1,
            slot_cursor: Slot::FIRST,
            test: TestState::Testing,
            history: HistoryState::SlotList,
            settings: SettingsState::List,
            result: TestResult::default(),
            viewed: TestResult::default(),
            requests: Vec::new(),
        }
    }

    /// Queue a request for the service.
    pub fn request(&mut self, req: Request) {
        if self.requests.push(req).is_err() {
            warn!("FSM: request queue full, dropping {:?}", req);
        }
    }

    /// Drain queued requests in order.
    pub fn take_requests(&mut self) -> Vec<Request, 4> {
        core::mem::take(&mut self.requests)
    }

    /// Move a one-based cursor up, clamped at 1.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1).max(1);
    }

    /// Move a one-based cursor down, clamped at `items`.
    pub fn cursor_down(&mut self, items: u8) {
        self.cursor = (self.cursor + 1).min(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut ctx = FsmContext::new(TesterConfig::default());
        ctx.cursor_up();
        assert_eq!(ctx.cursor, 1);
        for _ in 0..10 {
            ctx.cursor_down(RESULT_MENU_ITEMS);
        }
        assert_eq!(ctx.cursor, 4);
    }

    #[test]
    fn requests_drain_in_order() {
        let mut ctx = FsmContext::new(TesterConfig::default());
        ctx.request(Request::CheckReadiness);
        ctx.request(Request::Save(Slot::LAST));
        let reqs = ctx.take_requests();
        assert_eq!(reqs.as_slice(), &[Request::CheckReadiness, Request::Save(Slot::LAST)]);
        assert!(ctx.requests.is_empty());
    }

    #[test]
    fn overflowing_requests_are_dropped() {
        let mut ctx = FsmContext::new(TesterConfig::default());
        for _ in 0..6 {
            ctx.request(Request::CancelRun);
        }
        assert_eq!(ctx.requests.len(), 4);
    }
}
