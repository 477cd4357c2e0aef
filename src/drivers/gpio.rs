//! `embedded-hal` views of the board's raw GPIO and busy-wait delay.
//!
//! The stepper, buzzer and LCD drivers are written against the
//! `embedded-hal` 1.0 traits; these types plug the board into them.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::drivers::hw_init;

/// An output configured by [`hw_init`].
#[derive(Debug)]
pub struct BoardPin {
    gpio: i32,
}

impl BoardPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for BoardPin {
    type Error = Infallible;
}

impl OutputPin for BoardPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

/// Busy-wait delay.  On the board this spins on the ROM `ets_delay_us`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoardDelay;

impl DelayNs for BoardDelay {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
