//! Discharge current shunt.
//!
//! A low-ohm shunt in the load path feeds an instrumentation amplifier
//! whose output sits on one ADC1 channel.  Amps = pin volts / (gain × R).
//!
//! On host/test the raw count comes from a static atomic.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

static SIM_SHUNT_ADC: AtomicU16 = AtomicU16::new(0);

pub fn sim_set_shunt_adc(raw: u16) {
    SIM_SHUNT_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Default)]
pub struct ShuntMonitor;

impl ShuntMonitor {
    pub const fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    pub fn read_raw(&self) -> u16 {
        hw_init::adc1_read(pins::ADC1_CH_SHUNT)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&self) -> u16 {
        SIM_SHUNT_ADC.load(Ordering::Relaxed)
    }
}
