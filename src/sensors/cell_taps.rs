//! Cell tap voltage inputs.
//!
//! Each positive tap (B1..B4) reaches an ADC1 channel through the same
//! resistive divider.  The GND tap is the ADC reference and always reads 0.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from static atomics for injection.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

use crate::app::ports::Tap;

static SIM_TAP_ADC: [AtomicU16; 4] = [const { AtomicU16::new(0) }; 4];

/// Inject a raw count on one of the B1..B4 taps.  GND is ignored.
pub fn sim_set_tap_adc(tap: Tap, raw: u16) {
    if let Some(i) = tap_index(tap) {
        SIM_TAP_ADC[i].store(raw, Ordering::Relaxed);
    }
}

const fn tap_index(tap: Tap) -> Option<usize> {
    match tap {
        Tap::Gnd => None,
        Tap::B1 => Some(0),
        Tap::B2 => Some(1),
        Tap::B3 => Some(2),
        Tap::B4 => Some(3),
    }
}

#[derive(Debug, Default)]
pub struct CellTaps;

impl CellTaps {
    pub const fn new() -> Self {
        Self
    }

    /// Raw 12-bit count on `tap`.
    pub fn read_raw(&self, tap: Tap) -> u16 {
        match tap_index(tap) {
            Some(i) => read_adc(i),
            None => 0,
        }
    }
}

#[cfg(target_os = "espidf")]
fn read_adc(i: usize) -> u16 {
    const CHANNELS: [u32; 4] = [
        pins::ADC1_CH_B1,
        pins::ADC1_CH_B2,
        pins::ADC1_CH_B3,
        pins::ADC1_CH_B4,
    ];
    hw_init::adc1_read(CHANNELS[i])
}

#[cfg(not(target_os = "espidf"))]
fn read_adc(i: usize) -> u16 {
    SIM_TAP_ADC[i].load(Ordering::Relaxed)
}
