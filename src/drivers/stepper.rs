//! A4988 stepper driver turning the carbon-pile knob.
//!
//! STEP/DIR/SLEEP over `embedded-hal` output pins.  One [`pulse`] is one
//! full STEP period: high for half the period, low for the other half.
//!
//! ## Safety contract
//!
//! SLEEP is only released while the regulator or the open-circuit routine
//! is moving the knob.  The driver itself enforces nothing.
//!
//! [`pulse`]: StepperDriver::pulse

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, warn};

use crate::app::ports::Direction;

pub struct StepperDriver<STEP, DIR, SLEEP, D> {
    step: STEP,
    dir: DIR,
    sleep: SLEEP,
    delay: D,
    half_period_ns: u32,
    direction: Direction,
    awake: bool,
    /// Net pulses toward more current since boot.
    position: i32,
}

impl<STEP, DIR, SLEEP, D> StepperDriver<STEP, DIR, SLEEP, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    SLEEP: OutputPin,
    D: DelayNs,
{
    /// Build the driver asleep with DIR toward less current.
    pub fn new(step: STEP, dir: DIR, sleep: SLEEP, delay: D, step_period_us: u32) -> Self {
        let mut s = Self {
            step,
            dir,
            sleep,
            delay,
            half_period_ns: step_period_us.saturating_mul(1_000) / 2,
            direction: Direction::Decrease,
            awake: false,
            position: 0,
        };
        drive(&mut s.step, false);
        drive(&mut s.dir, false);
        drive(&mut s.sleep, false);
        s
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
        drive(&mut self.dir, dir == Direction::Increase);
    }

    /// One full STEP period.
    pub fn pulse(&mut self) {
        if !self.awake {
            debug!("STEPPER: pulse while asleep");
        }
        drive(&mut self.step, true);
        self.delay.delay_ns(self.half_period_ns);
        drive(&mut self.step, false);
        self.delay.delay_ns(self.half_period_ns);
        self.position += match self.direction {
            Direction::Increase => 1,
            Direction::Decrease => -1,
        };
    }

    /// Release (`true`) or assert (`false`) SLEEP.
    pub fn enable(&mut self, on: bool) {
        if self.awake != on {
            drive(&mut self.sleep, on);
            // A4988 needs 1 ms after waking before the first STEP.
            if on {
                self.delay.delay_ms(1);
            }
            self.awake = on;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.awake
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

fn drive(pin: &mut impl OutputPin, high: bool) {
    if pin.set_state(PinState::from(high)).is_err() {
        warn!("STEPPER: pin write failed");
    }
}
