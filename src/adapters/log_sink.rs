//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC on the board, stderr on the host).
//! Lines are prefixed by subsystem so a capture can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::RunOutcome;
use crate::safety::Verdict;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ReadinessChecked(Verdict::Testing) => {
                info!("TEST  | pack ready");
            }
            AppEvent::ReadinessChecked(Verdict::Error(fault)) => {
                warn!("TEST  | refused: {}", fault);
            }
            AppEvent::RunStarted { mode, amps, remote } => {
                info!(
                    "TEST  | start mode={} target={}A source={}",
                    mode.label(),
                    amps,
                    if *remote { "host" } else { "panel" }
                );
            }
            AppEvent::TargetReached(amps) => {
                info!("TEST  | target reached at {:.1}A", amps);
            }
            AppEvent::RunFinished(RunOutcome::Completed) => {
                info!("TEST  | completed");
            }
            AppEvent::RunFinished(RunOutcome::Cancelled) => {
                warn!("TEST  | cancelled");
            }
            AppEvent::ResultSaved(slot) => {
                info!("STORE | saved slot {}", slot.number());
            }
            AppEvent::ResultLoaded(slot) => {
                info!("STORE | loaded slot {}", slot.number());
            }
            AppEvent::ResultErased(slot) => {
                info!("STORE | erased slot {}", slot.number());
            }
            AppEvent::StoreFailed(e) => {
                warn!("STORE | failed: {}", e);
            }
            AppEvent::RemoteCommand(cmd) => {
                info!("REMOTE| {:?}", cmd);
            }
            AppEvent::RemoteRejected(e) => {
                warn!("REMOTE| rejected: {}", e);
            }
            AppEvent::ConfigSaved => {
                info!("CONFIG| saved");
            }
        }
    }
}
