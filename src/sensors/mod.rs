//! Sensor subsystem: the analog inputs and the aggregating [`SensorHub`].
//!
//! The hub owns the tap and shunt drivers, applies the front-end scaling
//! from [`TesterConfig`] and serves the core through [`SensorPort`].

pub mod cell_taps;
pub mod shunt;

use log::trace;

use crate::app::ports::{SensorPort, Tap};
use crate::config::TesterConfig;
use crate::pins::ADC_FULL_SCALE;
use cell_taps::CellTaps;
use shunt::ShuntMonitor;

/// Raw-count to engineering-unit conversion for the analog front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub adc_vref: f32,
    pub cell_divider_ratio: f32,
    pub shunt_resistance_ohms: f32,
    pub shunt_amp_gain: f32,
}

impl Scaling {
    pub fn from_config(cfg: &TesterConfig) -> Self {
        Self {
            adc_vref: cfg.adc_vref,
            cell_divider_ratio: cfg.cell_divider_ratio,
            shunt_resistance_ohms: cfg.shunt_resistance_ohms,
            shunt_amp_gain: cfg.shunt_amp_gain,
        }
    }

    /// Volts at the ADC pin.
    pub fn pin_volts(&self, raw: u16) -> f32 {
        f32::from(raw) / ADC_FULL_SCALE * self.adc_vref
    }

    /// Volts at the tap, undoing the divider.
    pub fn tap_volts(&self, raw: u16) -> f32 {
        self.pin_volts(raw) * self.cell_divider_ratio
    }

    /// Amps through the shunt.
    pub fn amps(&self, raw: u16) -> f32 {
        self.pin_volts(raw) / (self.shunt_amp_gain * self.shunt_resistance_ohms)
    }
}

/// Aggregates the analog inputs behind [`SensorPort`].
pub struct SensorHub {
    taps: CellTaps,
    shunt: ShuntMonitor,
    scaling: Scaling,
}

impl SensorHub {
    pub fn new(scaling: Scaling) -> Self {
        Self {
            taps: CellTaps::new(),
            shunt: ShuntMonitor::new(),
            scaling,
        }
    }

    /// Pick up new front-end constants after a settings change.
    pub fn set_scaling(&mut self, scaling: Scaling) {
        self.scaling = scaling;
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    fn tap_volts(&self, tap: Tap) -> f32 {
        match tap {
            Tap::Gnd => 0.0,
            _ => self.scaling.tap_volts(self.taps.read_raw(tap)),
        }
    }
}

impl SensorPort for SensorHub {
    fn read_cell_voltage(&mut self, pos: Tap, neg: Tap) -> f32 {
        let v = self.tap_volts(pos) - self.tap_volts(neg);
        trace!("SENSOR: {:?}-{:?} = {:.3} V", pos, neg, v);
        v
    }

    fn read_discharge_current(&mut self) -> f32 {
        self.scaling.amps(self.shunt.read_raw())
    }
}
