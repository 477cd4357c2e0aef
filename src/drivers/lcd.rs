//! 20×4 HD44780 character LCD behind a PCF8574 I²C backpack.
//!
//! The backpack maps its eight outputs onto the panel in 4-bit mode:
//!
//! ```text
//!  P7 P6 P5 P4 | P3        | P2 | P1 | P0
//!  D7 D6 D5 D4 | backlight | E  | RW | RS
//! ```
//!
//! Every byte is sent as two nibbles, each latched by an E pulse.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::DisplayPort;
use crate::ui::{COLS, ROWS, Screen};

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of column 0 on each row of a 20×4 panel.
const ROW_OFFSETS: [u8; ROWS] = [0x00, 0x40, 0x14, 0x54];

pub struct Lcd<I, D> {
    i2c: I,
    addr: u8,
    delay: D,
}

impl<I: I2c, D: DelayNs> Lcd<I, D> {
    pub fn new(i2c: I, addr: u8, delay: D) -> Self {
        Self { i2c, addr, delay }
    }

    /// Power-on sequence into 4-bit, two-line mode, cleared, cursor off.
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.delay.delay_ms(50);
        // Three 8-bit "function set" nibbles resynchronise the controller
        // whatever mode it woke up in.
        self.write_nibble(0x30, false)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x30, false)?;
        self.delay.delay_us(150);
        self.write_nibble(0x30, false)?;
        self.write_nibble(0x20, false)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_INCREMENT)
    }

    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Write one full row starting at column 0.
    pub fn write_line(&mut self, row: usize, text: &str) -> Result<(), I::Error> {
        let offset = ROW_OFFSETS[row.min(ROWS - 1)];
        self.command(CMD_SET_DDRAM | offset)?;
        for b in text.bytes().take(COLS) {
            self.send(b, true)?;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, false)
    }

    fn send(&mut self, byte: u8, data: bool) -> Result<(), I::Error> {
        self.write_nibble(byte & 0xF0, data)?;
        self.write_nibble(byte << 4, data)
    }

    fn write_nibble(&mut self, high_nibble: u8, data: bool) -> Result<(), I::Error> {
        let bits = (high_nibble & 0xF0) | BACKLIGHT | if data { RS } else { 0 };
        self.i2c.write(self.addr, &[bits | EN, bits])?;
        self.delay.delay_us(50);
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> DisplayPort for Lcd<I, D> {
    fn show(&mut self, screen: &Screen) {
        for (row, line) in screen.lines().enumerate() {
            if let Err(e) = self.write_line(row, line) {
                warn!("LCD: row {} write failed: {:?}", row, e);
                return;
            }
        }
    }
}
