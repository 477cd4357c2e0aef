//! Piezo buzzer on a plain output pin.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

pub struct Buzzer<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Buzzer<P> {
    /// Build the buzzer silent.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("BUZZER: pin write failed");
        }
        Self { pin, on: false }
    }

    pub fn set(&mut self, on: bool) {
        if self.on == on {
            return;
        }
        if self.pin.set_state(PinState::from(on)).is_err() {
            warn!("BUZZER: pin write failed");
            return;
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
