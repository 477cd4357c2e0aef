//! Tester configuration parameters
//!
//! All tunable parameters for the quad-pack tester.
//! Values can be overridden from the Settings menu and are persisted in NVS.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::TestMode;

/// Number of decimals shown on the voltage view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoltagePrecision {
    /// Three decimals (millivolts).
    High,
    /// Two decimals.
    Low,
}

impl VoltagePrecision {
    pub const fn decimals(self) -> usize {
        match self {
            Self::High => 3,
            Self::Low => 2,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::High,
        }
    }
}

/// Core tester configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesterConfig {
    // --- Test procedure ---
    /// Local tests run with the stepper (Automated) or the operator's hand (Manual).
    pub test_mode: TestMode,
    /// Target discharge current for local tests (amps, 1–999).
    pub load_current_amps: u16,
    /// Minimum unloaded cell voltage for a test to start (volts).
    pub min_cell_voltage: f32,
    /// Pack voltage above which the gate reports a connection error (volts).
    pub connection_ceiling_voltage: f32,
    /// Regulation dead band around the target current (amps).
    pub regulation_band_amps: f32,
    /// Current at or below which the load counts as open (amps).
    pub open_circuit_amps: f32,

    // --- Actuator ---
    /// Extra decrease pulses issued after the load opens.
    pub open_circuit_margin_steps: u16,
    /// Stepper STEP pulse period (microseconds).
    pub step_period_us: u32,
    /// Upper bound on actuator pulses issued per control tick.
    pub steps_per_tick: u16,

    // --- Display ---
    pub voltage_precision: VoltagePrecision,

    // --- Analog front end ---
    /// ADC reference voltage (volts).
    pub adc_vref: f32,
    /// Resistive divider ratio on every cell tap.
    pub cell_divider_ratio: f32,
    /// Discharge shunt resistance (ohms).
    pub shunt_resistance_ohms: f32,
    /// Gain of the shunt instrumentation amplifier.
    pub shunt_amp_gain: f32,

    // --- Timing ---
    /// Control loop interval (milliseconds).
    pub control_tick_ms: u32,
    /// Buzzer half-period while waiting for the operator to back off (ticks).
    pub buzzer_period_ticks: u16,
    /// Buzzer hold after an automated release (ticks).
    pub cooldown_ticks: u16,
    /// Pause between bytes on the host serial link (milliseconds).
    pub serial_inter_byte_ms: u32,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            // Test procedure
            test_mode: TestMode::Automated,
            load_current_amps: 30,
            min_cell_voltage: 3.0,
            connection_ceiling_voltage: 20.0,
            regulation_band_amps: 1.0,
            open_circuit_amps: 1.0,

            // Actuator (A4988 full-step)
            open_circuit_margin_steps: 50,
            step_period_us: 2250,
            steps_per_tick: 20,

            // Display
            voltage_precision: VoltagePrecision::High,

            // Analog front end
            adc_vref: 2.048,
            cell_divider_ratio: 5.3,
            shunt_resistance_ohms: 0.000_145,
            shunt_amp_gain: 20.0,

            // Timing
            control_tick_ms: 50,     // 20 Hz
            buzzer_period_ticks: 20, // 1 s on / 1 s off
            cooldown_ticks: 20,      // 1 s
            serial_inter_byte_ms: 10,
        }
    }
}

impl TesterConfig {
    /// Range-check every field.  [`ConfigPort`](crate::app::ports::ConfigPort)
    /// implementations call this before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=999).contains(&self.load_current_amps) {
            return Err(ConfigError::ValidationFailed(
                "load_current_amps must be 1–999",
            ));
        }
        if !(0.5..=5.0).contains(&self.min_cell_voltage) {
            return Err(ConfigError::ValidationFailed(
                "min_cell_voltage must be 0.5–5.0",
            ));
        }
        if !(1.0..=60.0).contains(&self.connection_ceiling_voltage) {
            return Err(ConfigError::ValidationFailed(
                "connection_ceiling_voltage must be 1.0–60.0",
            ));
        }
        if !(0.1..=10.0).contains(&self.regulation_band_amps) {
            return Err(ConfigError::ValidationFailed(
                "regulation_band_amps must be 0.1–10.0",
            ));
        }
        if !(0.1..=10.0).contains(&self.open_circuit_amps) {
            return Err(ConfigError::ValidationFailed(
                "open_circuit_amps must be 0.1–10.0",
            ));
        }
        if self.open_circuit_margin_steps > 1000 {
            return Err(ConfigError::ValidationFailed(
                "open_circuit_margin_steps must be 0–1000",
            ));
        }
        if !(100..=100_000).contains(&self.step_period_us) {
            return Err(ConfigError::ValidationFailed(
                "step_period_us must be 100–100000",
            ));
        }
        if !(1..=500).contains(&self.steps_per_tick) {
            return Err(ConfigError::ValidationFailed(
                "steps_per_tick must be 1–500",
            ));
        }
        if !(self.adc_vref > 0.0 && self.adc_vref <= 5.0) {
            return Err(ConfigError::ValidationFailed("adc_vref must be 0–5.0"));
        }
        if !(self.cell_divider_ratio >= 1.0 && self.cell_divider_ratio <= 100.0) {
            return Err(ConfigError::ValidationFailed(
                "cell_divider_ratio must be 1.0–100.0",
            ));
        }
        if !(self.shunt_resistance_ohms > 0.0 && self.shunt_resistance_ohms <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "shunt_resistance_ohms must be 0–1.0",
            ));
        }
        if !(self.shunt_amp_gain >= 1.0 && self.shunt_amp_gain <= 1000.0) {
            return Err(ConfigError::ValidationFailed(
                "shunt_amp_gain must be 1–1000",
            ));
        }
        if !(10..=1000).contains(&self.control_tick_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_tick_ms must be 10–1000",
            ));
        }
        if self.buzzer_period_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "buzzer_period_ticks must be non-zero",
            ));
        }
        if self.serial_inter_byte_ms > 1000 {
            return Err(ConfigError::ValidationFailed(
                "serial_inter_byte_ms must be 0–1000",
            ));
        }
        Ok(())
    }
}
