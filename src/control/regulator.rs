//! Bang-bang discharge current regulator and the open-circuit primitive.
//!
//! ```text
//!   measure ──▶ error = measured − target
//!                 │
//!       |error| ≤ band ──▶ Reached
//!                 │
//!       error ≤ 0 ──▶ Increase ─┐
//!       error > 0 ──▶ Decrease ─┴─▶ one pulse ──▶ measure …
//! ```
//!
//! Both loops are exposed as step machines ([`CurrentRegulator::step`],
//! [`OpenCircuit::step`]) so the service can interleave them with input
//! handling, plus blocking wrappers ([`regulate`], [`open_circuit`]) that
//! drive a step machine to completion.
//!
//! There is no timeout.  If the target current is physically unreachable
//! the regulator keeps pulsing until it is cancelled; an operator watching
//! the current meter is the only guard.

use log::{debug, info};

use super::cancel::CancelToken;
use crate::app::ports::{ActuatorPort, Direction, SensorPort};
use crate::config::TesterConfig;

/// Result of one regulator iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// One pulse issued; carries the current measured before it.
    Pending(f32),
    /// Within the band; carries the achieved current.
    Reached(f32),
    /// A cancellation request was consumed.  The caller must open the
    /// circuit.
    Cancelled,
}

/// Outcome of a complete regulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegulationOutcome {
    Reached(f32),
    Cancelled,
}

/// Drives the load toward a target current, one pulse per step.
pub struct CurrentRegulator {
    target: f32,
    band: f32,
    engaged: bool,
}

impl CurrentRegulator {
    pub fn new(target_amps: f32, config: &TesterConfig) -> Self {
        Self {
            target: target_amps,
            band: config.regulation_band_amps,
            engaged: false,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// One iteration: poll cancel, sample, compare, pulse.
    pub fn step(&mut self, hw: &mut (impl SensorPort + ActuatorPort), cancel: &CancelToken) -> Step {
        if !self.engaged {
            hw.enable_actuator(true);
            self.engaged = true;
        }

        if cancel.take() {
            info!("REGULATOR: cancelled at target {:.1} A", self.target);
            return Step::Cancelled;
        }

        let measured = hw.read_discharge_current();
        let error = measured - self.target;

        if error.abs() <= self.band {
            hw.enable_actuator(false);
            self.engaged = false;
            info!(
                "REGULATOR: reached {:.1} A (target {:.1} A)",
                measured, self.target
            );
            return Step::Reached(measured);
        }

        hw.set_direction(if error <= 0.0 {
            Direction::Increase
        } else {
            Direction::Decrease
        });
        hw.actuate_step();
        Step::Pending(measured)
    }
}

// ───────────────────────────────────────────────────────────────
// Open circuit
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Decrease pulses until the current is at or below the threshold.
    Draining,
    /// Mechanical margin pulses issued so far.
    Margin(u16),
    Done,
}

/// Safe-state primitive: back the load off to zero current.
pub struct OpenCircuit {
    phase: Release,
    threshold: f32,
    margin: u16,
    engaged: bool,
}

impl OpenCircuit {
    pub fn new(config: &TesterConfig) -> Self {
        Self {
            phase: Release::Draining,
            threshold: config.open_circuit_amps,
            margin: config.open_circuit_margin_steps,
            engaged: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Release::Done
    }

    /// Advance by at most one pulse.  Returns `true` once the actuator has
    /// been disabled; further calls do nothing.
    pub fn step(&mut self, hw: &mut (impl SensorPort + ActuatorPort)) -> bool {
        if self.phase == Release::Done {
            return true;
        }
        if !self.engaged {
            hw.enable_actuator(true);
            hw.set_direction(Direction::Decrease);
            self.engaged = true;
        }

        match self.phase {
            Release::Draining => {
                let amps = hw.read_discharge_current();
                if amps > self.threshold {
                    hw.actuate_step();
                } else {
                    debug!("OPEN: {:.1} A, issuing {} margin steps", amps, self.margin);
                    self.phase = Release::Margin(0);
                }
                false
            }
            Release::Margin(n) if n < self.margin => {
                hw.actuate_step();
                self.phase = Release::Margin(n + 1);
                false
            }
            Release::Margin(_) => {
                hw.enable_actuator(false);
                self.engaged = false;
                self.phase = Release::Done;
                info!("OPEN: load disengaged");
                true
            }
            Release::Done => true,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Blocking wrappers
// ───────────────────────────────────────────────────────────────

/// Regulate to `target_amps`, opening the circuit if cancelled.
pub fn regulate(
    hw: &mut (impl SensorPort + ActuatorPort),
    config: &TesterConfig,
    target_amps: f32,
    cancel: &CancelToken,
) -> RegulationOutcome {
    let mut reg = CurrentRegulator::new(target_amps, config);
    loop {
        match reg.step(hw, cancel) {
            Step::Pending(_) => {}
            Step::Reached(amps) => return RegulationOutcome::Reached(amps),
            Step::Cancelled => {
                open_circuit(hw, config);
                return RegulationOutcome::Cancelled;
            }
        }
    }
}

/// Drive the load to zero current and disable the actuator.
pub fn open_circuit(hw: &mut (impl SensorPort + ActuatorPort), config: &TesterConfig) {
    let mut oc = OpenCircuit::new(config);
    while !oc.step(hw) {}
}
