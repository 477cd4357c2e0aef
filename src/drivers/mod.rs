//! Actuator and display drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod buzzer;
pub mod gpio;
pub mod hw_init;
pub mod lcd;
pub mod stepper;
pub mod watchdog;
