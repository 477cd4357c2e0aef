//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; on the board they become log lines.

use crate::app::commands::AppCommand;
use crate::control::RunOutcome;
use crate::error::{ProtocolError, StoreError};
use crate::fsm::StateId;
use crate::model::{Slot, TestMode};
use crate::safety::Verdict;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The local interface moved between top-level states.
    StateChanged { from: StateId, to: StateId },

    /// The safety gate ran.
    ReadinessChecked(Verdict),

    /// A loaded test began.
    RunStarted {
        mode: TestMode,
        amps: u16,
        remote: bool,
    },

    /// Loaded voltages were captured at this current.
    TargetReached(f32),

    RunFinished(RunOutcome),

    ResultSaved(Slot),
    ResultLoaded(Slot),
    ResultErased(Slot),
    StoreFailed(StoreError),

    /// A complete host command was accepted.
    RemoteCommand(AppCommand),

    /// A host command was refused.
    RemoteRejected(ProtocolError),

    /// Settings were persisted.
    ConfigSaved,
}
