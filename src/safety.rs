//! Safety gate.
//!
//! Runs before every local test and for the host's unloaded test, and
//! decides whether the pack may be loaded.
//!
//! ## Decision order (first match wins)
//!
//! 1. Pack voltage (B4 − GND) above the connection ceiling → `Connection`.
//! 2. Any cell below the minimum unloaded voltage → `Safety`.
//! 3. Otherwise → `Testing`.
//!
//! Rule 1 fires on a *high* reading.  A missing pack reads near zero, which
//! this rule never catches; the comparison is kept exactly as the
//! instrument has always shipped it and is logged as a suspected sign
//! inversion every time it fires.
//!
//! There is no retry counter or latch: an error is terminal for the
//! attempt, and the gate runs again in full on the next one.

use log::{info, warn};

use crate::app::ports::{SensorPort, Tap};
use crate::config::TesterConfig;
use crate::error::TestFault;
use crate::model::CELL_COUNT;

/// Outcome of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The pack may be tested.
    Testing,
    /// The attempt is refused.
    Error(TestFault),
}

/// Read the four cells as successive differential taps, cell 1 first.
pub fn measure_cells(sensors: &mut impl SensorPort) -> [f32; CELL_COUNT] {
    let mut neg = Tap::Gnd;
    Tap::CELL_POSITIVE.map(|pos| {
        let v = sensors.read_cell_voltage(pos, neg);
        neg = pos;
        v
    })
}

/// Whole-pack voltage in a single differential measurement.
pub fn measure_pack(sensors: &mut impl SensorPort) -> f32 {
    sensors.read_cell_voltage(Tap::B4, Tap::Gnd)
}

/// Safety gate.
pub struct SafetyGate {
    connection_ceiling_v: f32,
    min_cell_v: f32,
    /// Per-cell readings from the last check.
    scratch: [f32; CELL_COUNT],
    last_pack_v: f32,
}

impl SafetyGate {
    pub fn new(config: &TesterConfig) -> Self {
        Self {
            connection_ceiling_v: config.connection_ceiling_voltage,
            min_cell_v: config.min_cell_voltage,
            scratch: [0.0; CELL_COUNT],
            last_pack_v: 0.0,
        }
    }

    /// Pick up thresholds after a settings change.
    pub fn reconfigure(&mut self, config: &TesterConfig) {
        self.connection_ceiling_v = config.connection_ceiling_voltage;
        self.min_cell_v = config.min_cell_voltage;
    }

    /// Measure the pack and each cell, then classify.
    ///
    /// Always refreshes the scratch buffer, even when the pack check fails,
    /// so callers can report what the cells read.  Does not touch any
    /// [`TestResult`](crate::model::TestResult).
    pub fn check_readiness(&mut self, sensors: &mut impl SensorPort) -> Verdict {
        self.last_pack_v = measure_pack(sensors);
        self.scratch = measure_cells(sensors);

        // ── Connection ────────────────────────────────────────
        if self.last_pack_v > self.connection_ceiling_v {
            warn!(
                "SAFETY: pack {:.2} V above {:.1} V ceiling -> connection error \
                 (high-voltage rule; suspected sign inversion)",
                self.last_pack_v, self.connection_ceiling_v
            );
            return Verdict::Error(TestFault::Connection);
        }

        // ── Per-cell minimum ──────────────────────────────────
        if let Some((idx, v)) = self
            .scratch
            .iter()
            .enumerate()
            .find(|&(_, &v)| v < self.min_cell_v)
        {
            warn!(
                "SAFETY: cell B{} at {:.3} V below {:.2} V minimum",
                idx + 1,
                v,
                self.min_cell_v
            );
            return Verdict::Error(TestFault::Safety);
        }

        info!("SAFETY: pack {:.2} V, all cells above minimum", self.last_pack_v);
        Verdict::Testing
    }

    /// Cell readings from the most recent check.
    pub fn scratch(&self) -> &[f32; CELL_COUNT] {
        &self.scratch
    }

    /// Pack reading from the most recent check.
    #[cfg(test)]
    fn last_pack_voltage(&self) -> f32 {
        self.last_pack_v
    }
}
