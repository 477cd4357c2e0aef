//! One loaded test, advanced once per control tick.
//!
//! ```text
//!            ┌──────────── Automated ─────────────┐
//!  Unloaded ─┤ Regulating ─▶ Releasing ─▶ Cooldown ├─▶ Finished(Completed)
//!            │ RampUp ─────▶ BackOff ──────────────┤
//!            └──────────── Manual ────────────────┘
//!
//!  Regulating ─[cancel]─▶ Aborting ────▶ Finished(Cancelled)
//!  RampUp ─────[cancel]─▶ ManualAbort ─▶ Finished(Cancelled)
//! ```
//!
//! In automated mode the stepper drives the load; in manual mode the
//! operator turns the knob and the run only samples and beeps.

use log::info;

use super::cancel::CancelToken;
use super::regulator::{CurrentRegulator, OpenCircuit, Step};
use crate::app::ports::{ActuatorPort, EnvironmentPort, SensorPort};
use crate::config::TesterConfig;
use crate::model::{TestMode, TestResult};
use crate::safety::measure_cells;

/// What to run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSpec {
    pub mode: TestMode,
    pub target_amps: u16,
    /// Local tests record unloaded voltages first; remote loaded tests
    /// rely on an earlier `u` command.
    pub measure_unloaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Returned by every [`TestRun::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    /// The target was reached this tick and loaded voltages recorded.
    TargetReached,
    Finished(RunOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unloaded,
    Regulating,
    RampUp,
    /// Automated: buzzer on while the stepper opens the circuit.
    Releasing,
    /// Automated: buzzer held for the remaining ticks.
    Cooldown(u16),
    /// Manual: beeping until the operator returns the knob to zero.
    BackOff { ticks: u16 },
    Aborting,
    ManualAbort,
    Finished(RunOutcome),
}

pub struct TestRun {
    spec: RunSpec,
    phase: Phase,
    regulator: CurrentRegulator,
    release: OpenCircuit,
    live_current: f32,
    buzzer: bool,
}

impl TestRun {
    /// Prepare a run.  Clears any stale cancellation request.
    pub fn new(spec: RunSpec, config: &TesterConfig, cancel: &CancelToken) -> Self {
        cancel.clear();
        info!(
            "RUN: {} test at {} A",
            spec.mode.label(),
            spec.target_amps
        );
        Self {
            spec,
            phase: if spec.measure_unloaded {
                Phase::Unloaded
            } else {
                Self::loading_phase(spec.mode)
            },
            regulator: CurrentRegulator::new(f32::from(spec.target_amps), config),
            release: OpenCircuit::new(config),
            live_current: 0.0,
            buzzer: false,
        }
    }

    fn loading_phase(mode: TestMode) -> Phase {
        match mode {
            TestMode::Automated => Phase::Regulating,
            TestMode::Manual => Phase::RampUp,
        }
    }

    pub fn spec(&self) -> &RunSpec {
        &self.spec
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Most recent discharge current sample.
    pub fn live_current(&self) -> f32 {
        self.live_current
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Advance by one control tick.
    pub fn tick<H>(
        &mut self,
        hw: &mut H,
        config: &TesterConfig,
        cancel: &CancelToken,
        result: &mut TestResult,
    ) -> RunStatus
    where
        H: SensorPort + ActuatorPort + EnvironmentPort,
    {
        match self.phase {
            Phase::Unloaded => {
                result.unloaded = measure_cells(hw);
                self.phase = Self::loading_phase(self.spec.mode);
                RunStatus::Running
            }

            Phase::Regulating => {
                for _ in 0..config.steps_per_tick.max(1) {
                    match self.regulator.step(hw, cancel) {
                        Step::Pending(amps) => self.live_current = amps,
                        Step::Reached(amps) => {
                            self.record_loaded(hw, result, amps);
                            self.set_buzzer(hw, true);
                            self.phase = Phase::Releasing;
                            return RunStatus::TargetReached;
                        }
                        Step::Cancelled => {
                            self.phase = Phase::Aborting;
                            return RunStatus::Running;
                        }
                    }
                }
                RunStatus::Running
            }

            Phase::RampUp => {
                if cancel.take() {
                    info!("RUN: manual test cancelled");
                    self.phase = Phase::ManualAbort;
                    return RunStatus::Running;
                }
                let amps = hw.read_discharge_current();
                self.live_current = amps;
                if amps >= self.regulator.target() - config.regulation_band_amps {
                    self.record_loaded(hw, result, amps);
                    self.phase = Phase::BackOff { ticks: 0 };
                    return RunStatus::TargetReached;
                }
                RunStatus::Running
            }

            Phase::Releasing => {
                if self.drive_release(hw, config) {
                    self.phase = Phase::Cooldown(config.cooldown_ticks);
                }
                RunStatus::Running
            }

            Phase::Cooldown(0) => {
                self.set_buzzer(hw, false);
                self.finish(hw, result, RunOutcome::Completed)
            }
            Phase::Cooldown(n) => {
                self.phase = Phase::Cooldown(n - 1);
                RunStatus::Running
            }

            Phase::BackOff { ticks } => {
                let amps = hw.read_discharge_current();
                self.live_current = amps;
                if amps <= config.open_circuit_amps {
                    self.set_buzzer(hw, false);
                    return self.finish(hw, result, RunOutcome::Completed);
                }
                let period = config.buzzer_period_ticks.max(1);
                self.set_buzzer(hw, (ticks / period) % 2 == 0);
                self.phase = Phase::BackOff {
                    ticks: ticks.wrapping_add(1),
                };
                RunStatus::Running
            }

            Phase::Aborting => {
                if self.drive_release(hw, config) {
                    cancel.clear();
                    return self.finish(hw, result, RunOutcome::Cancelled);
                }
                RunStatus::Running
            }

            Phase::ManualAbort => {
                let amps = hw.read_discharge_current();
                self.live_current = amps;
                if amps <= config.open_circuit_amps {
                    cancel.clear();
                    return self.finish(hw, result, RunOutcome::Cancelled);
                }
                RunStatus::Running
            }

            Phase::Finished(outcome) => RunStatus::Finished(outcome),
        }
    }

    /// Up to `steps_per_tick` open-circuit pulses; `true` once disengaged.
    fn drive_release(&mut self, hw: &mut (impl SensorPort + ActuatorPort), config: &TesterConfig) -> bool {
        for _ in 0..config.steps_per_tick.max(1) {
            if self.release.step(hw) {
                self.live_current = hw.read_discharge_current();
                return true;
            }
        }
        false
    }

    fn record_loaded(&mut self, hw: &mut impl SensorPort, result: &mut TestResult, amps: f32) {
        self.live_current = amps;
        result.loaded = measure_cells(hw);
        result.max_load_current = amps.round().clamp(0.0, f32::from(u16::MAX)) as u16;
        result.test_mode = self.spec.mode;
        info!("RUN: target reached at {:.1} A, loaded voltages recorded", amps);
    }

    fn set_buzzer(&mut self, hw: &mut impl ActuatorPort, on: bool) {
        if self.buzzer != on {
            hw.sound(on);
            self.buzzer = on;
        }
    }

    fn finish(
        &mut self,
        env: &mut impl EnvironmentPort,
        result: &mut TestResult,
        outcome: RunOutcome,
    ) -> RunStatus {
        if outcome == RunOutcome::Completed {
            result.ambient_temp = env.ambient_temp_c();
            result.date = env.today();
        }
        info!("RUN: finished ({:?})", outcome);
        self.phase = Phase::Finished(outcome);
        RunStatus::Finished(outcome)
    }
}
