//! Discharge current control.

pub mod cancel;
pub mod regulator;
pub mod run;

pub use cancel::{CANCEL, CancelToken};
pub use regulator::{CurrentRegulator, OpenCircuit, RegulationOutcome, Step, open_circuit, regulate};
pub use run::{Phase, RunOutcome, RunSpec, RunStatus, TestRun};
