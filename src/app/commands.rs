//! Inbound commands to the application service.
//!
//! These are actions requested by the host over the serial link, decoded
//! by [`CommandDecoder`](crate::remote::CommandDecoder) and carried out by
//! the [`AppService`](super::service::AppService) with the same safety
//! gate, regulator and store the local menus use.

use crate::model::{Slot, TestMode};

/// Commands the host can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// `u`: run the safety gate and report unloaded voltages.
    UnloadedTest,

    /// `m###` / `a###`: loaded test at the given current.
    LoadedTest { mode: TestMode, amps: u16 },

    /// `r`: send the in-memory result.
    SendResult,

    /// `0#` / `1#`: send the result stored in a slot.
    SendSlot(Slot),

    /// `c`: stop the running loaded test.
    Cancel,
}
