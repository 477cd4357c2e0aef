//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (cell taps, stepper, buzzer, display, EEPROM, serial
//! link) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Sensor, actuator and display calls are infallible: the instrument has a
//! single purpose and no recovery path for a dead ADC.  Only persistence
//! returns typed errors.

use crate::config::TesterConfig;
use crate::error::{ConfigError, StorageError};
use crate::model::TestDate;
use crate::ui::Screen;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Battery tap points wired to the analog front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    /// Pack negative terminal.
    Gnd,
    /// Positive terminal of cell 1.
    B1,
    B2,
    B3,
    /// Positive terminal of cell 4 (pack positive).
    B4,
}

impl Tap {
    /// Positive taps of cells 1–4, in order.
    pub const CELL_POSITIVE: [Tap; 4] = [Tap::B1, Tap::B2, Tap::B3, Tap::B4];
}

/// Read-side port: the domain calls this to obtain measurements.
pub trait SensorPort {
    /// Differential voltage `pos − neg` in volts, divider already applied.
    fn read_cell_voltage(&mut self, pos: Tap, neg: Tap) -> f32;

    /// Current through the discharge shunt in amps.
    fn read_discharge_current(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Which way the next actuator pulse moves the discharge current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Lower the load resistance (more current).
    Increase,
    /// Raise the load resistance (less current).
    Decrease,
}

/// Write-side port: the domain calls this to command the stepper and buzzer.
pub trait ActuatorPort {
    /// Latch the direction for subsequent pulses.
    fn set_direction(&mut self, dir: Direction);

    /// Issue exactly one actuator pulse.
    fn actuate_step(&mut self);

    /// Power the stepper driver (`false` puts it to sleep).
    fn enable_actuator(&mut self, on: bool);

    /// Buzzer on or off.
    fn sound(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character LCD)
// ───────────────────────────────────────────────────────────────

/// A 4 × 20 character surface.  The domain always writes whole screens of
/// space-padded lines.
pub trait DisplayPort {
    fn show(&mut self, screen: &Screen);
}

// ───────────────────────────────────────────────────────────────
// Environment port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Conditions stamped into every completed result.
pub trait EnvironmentPort {
    /// Ambient temperature in whole degrees Celsius.
    fn ambient_temp_c(&mut self) -> u8;

    /// Today's date.
    fn today(&mut self) -> TestDate;
}

/// Everything the tester core drives on the board, as one bound.
pub trait TesterHardware: SensorPort + ActuatorPort + DisplayPort + EnvironmentPort {}

impl<T: SensorPort + ActuatorPort + DisplayPort + EnvironmentPort> TesterHardware for T {}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: host link ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Byte-level host serial link.
pub trait SerialPort {
    /// Next received byte, if one is waiting.
    fn read_byte(&mut self) -> Option<u8>;

    /// Transmit one byte (blocking until it is in the shift register).
    fn write_byte(&mut self, byte: u8);

    /// Busy-wait between transmitted bytes.
    fn pause_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists tester configuration.
///
/// Implementations MUST call [`TesterConfig::validate`] before persisting
/// and reject invalid values with [`ConfigError::ValidationFailed`], not
/// silently clamp them.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`TesterConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<TesterConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &TesterConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ EEPROM / flash)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile memory holding the result slots.
///
/// A single `write` call is assumed atomic at record granularity.  Media
/// that cannot guarantee this must provide it themselves (the ESP-IDF NVS
/// backend commits whole blobs).
pub trait StoragePort {
    /// Fill `buf` from `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Total addressable bytes.
    fn capacity(&self) -> usize;
}
