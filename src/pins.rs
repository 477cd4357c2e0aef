//! GPIO / peripheral pin assignments for the tester main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Cell taps (ADC1, each through the cell divider)
// ---------------------------------------------------------------------------

/// ADC1 channel on the B1 tap (GPIO 1).
pub const ADC1_CH_B1: u32 = 0;
/// ADC1 channel on the B2 tap (GPIO 2).
pub const ADC1_CH_B2: u32 = 1;
/// ADC1 channel on the B3 tap (GPIO 3).
pub const ADC1_CH_B3: u32 = 2;
/// ADC1 channel on the B4 tap, pack positive (GPIO 7).
pub const ADC1_CH_B4: u32 = 6;

// ---------------------------------------------------------------------------
// Discharge current (shunt instrumentation amplifier output)
// ---------------------------------------------------------------------------

/// ADC1 channel on the shunt amplifier (GPIO 10).
pub const ADC1_CH_SHUNT: u32 = 9;

/// ADC full-scale count (12-bit).
pub const ADC_FULL_SCALE: f32 = 4095.0;

// ---------------------------------------------------------------------------
// Carbon-pile stepper (A4988)
// ---------------------------------------------------------------------------

pub const STEPPER_STEP_GPIO: i32 = 11;
/// HIGH turns the knob toward more current.
pub const STEPPER_DIR_GPIO: i32 = 12;
/// Active-low SLEEP; LOW powers the driver down.
pub const STEPPER_SLEEP_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Front-panel buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_OK_GPIO: i32 = 4;
pub const BUTTON_BACK_GPIO: i32 = 5;
pub const BUTTON_UP_GPIO: i32 = 6;
pub const BUTTON_DOWN_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// 20×4 character LCD (HD44780 behind a PCF8574 I²C backpack)
// ---------------------------------------------------------------------------

pub const LCD_SDA_GPIO: i32 = 8;
pub const LCD_SCL_GPIO: i32 = 9;
pub const LCD_I2C_ADDR: u8 = 0x27;
pub const LCD_I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Host link (UART1)
// ---------------------------------------------------------------------------

pub const HOST_UART_TX_GPIO: i32 = 17;
pub const HOST_UART_RX_GPIO: i32 = 18;
pub const HOST_UART_BAUD: u32 = 9600;
