//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the stepper and buzzer drivers, the display and
//! the environment source, exposing them through [`SensorPort`],
//! [`ActuatorPort`], [`DisplayPort`] and [`EnvironmentPort`].  On
//! non-espidf targets the underlying drivers use cfg-gated simulation
//! stubs.

use crate::adapters::environment::Esp32Environment;
use crate::app::ports::{
    ActuatorPort, Direction, DisplayPort, EnvironmentPort, SensorPort, Tap,
};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::gpio::{BoardDelay, BoardPin};
use crate::drivers::stepper::StepperDriver;
use crate::model::TestDate;
use crate::pins;
use crate::sensors::{Scaling, SensorHub};
use crate::ui::Screen;

/// The A4988 on its board pins.
pub type BoardStepper = StepperDriver<BoardPin, BoardPin, BoardPin, BoardDelay>;

/// Build the stepper on the board's STEP/DIR/SLEEP pins.
pub fn board_stepper(step_period_us: u32) -> BoardStepper {
    StepperDriver::new(
        BoardPin::new(pins::STEPPER_STEP_GPIO),
        BoardPin::new(pins::STEPPER_DIR_GPIO),
        BoardPin::new(pins::STEPPER_SLEEP_GPIO),
        BoardDelay,
        step_period_us,
    )
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<L> {
    sensor_hub: SensorHub,
    stepper: BoardStepper,
    buzzer: Buzzer<BoardPin>,
    display: L,
    environment: Esp32Environment,
}

impl<L: DisplayPort> HardwareAdapter<L> {
    pub fn new(
        sensor_hub: SensorHub,
        stepper: BoardStepper,
        buzzer: Buzzer<BoardPin>,
        display: L,
        environment: Esp32Environment,
    ) -> Self {
        Self {
            sensor_hub,
            stepper,
            buzzer,
            display,
            environment,
        }
    }

    /// Pick up new analog front-end constants.
    pub fn set_scaling(&mut self, scaling: Scaling) {
        self.sensor_hub.set_scaling(scaling);
    }

    /// Net stepper position since boot, in pulses toward more current.
    pub fn stepper_position(&self) -> i32 {
        self.stepper.position()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<L> SensorPort for HardwareAdapter<L> {
    fn read_cell_voltage(&mut self, pos: Tap, neg: Tap) -> f32 {
        self.sensor_hub.read_cell_voltage(pos, neg)
    }

    fn read_discharge_current(&mut self) -> f32 {
        self.sensor_hub.read_discharge_current()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<L> ActuatorPort for HardwareAdapter<L> {
    fn set_direction(&mut self, dir: Direction) {
        self.stepper.set_direction(dir);
    }

    fn actuate_step(&mut self) {
        self.stepper.pulse();
    }

    fn enable_actuator(&mut self, on: bool) {
        self.stepper.enable(on);
    }

    fn sound(&mut self, on: bool) {
        self.buzzer.set(on);
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<L: DisplayPort> DisplayPort for HardwareAdapter<L> {
    fn show(&mut self, screen: &Screen) {
        self.display.show(screen);
    }
}

// ── EnvironmentPort implementation ────────────────────────────

impl<L> EnvironmentPort for HardwareAdapter<L> {
    fn ambient_temp_c(&mut self) -> u8 {
        self.environment.ambient_temp_c()
    }

    fn today(&mut self) -> TestDate {
        self.environment.today()
    }
}
