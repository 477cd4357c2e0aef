//! Reply bytes and result framing for the host link.
//!
//! ```text
//!  'u' v1 v2 v3 v4   unloaded voltages, 5 bytes each ("%.3f", cut to 5)
//!  'l' v1 v2 v3 v4   loaded voltages
//!  'h' g1 g2 g3 g4   health codes, 2 bytes each ("A+", "F ")
//!  'c' nnnnn         max load current, left-justified, space-padded
//! ```
//!
//! 57 bytes in all.  No checksum, no escaping.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::app::ports::SerialPort;
use crate::control::RunOutcome;
use crate::health::classify_result;
use crate::model::{CELL_COUNT, TestMode, TestResult};

// ── Status bytes ──────────────────────────────────────────────

/// Unloaded test passed.
pub const UNLOADED_OK: u8 = b'd';
/// No coherent battery connection.
pub const NO_CONNECTION: u8 = b'e';
/// A cell is below the minimum; voltages follow.
pub const LOW_VOLTAGE: u8 = b'v';
/// Manual test reached its target; the operator should back off.
pub const TARGET_REACHED: u8 = b'i';
pub const MANUAL_DONE: u8 = b'f';
pub const AUTOMATED_DONE: u8 = b'a';
pub const CANCELLED: u8 = b'c';

/// Width of every numeric field.
pub const FIELD_LEN: usize = 5;
/// Length of a full result frame.
pub const RESULT_FRAME_LEN: usize = 1 + 4 * FIELD_LEN + 1 + 4 * FIELD_LEN + 1 + 2 * CELL_COUNT + 1 + FIELD_LEN;

pub type Frame = Vec<u8, 64>;

const _: () = assert!(RESULT_FRAME_LEN <= 64);

/// Final status byte of a loaded test.
pub fn completion_byte(mode: TestMode, outcome: RunOutcome) -> u8 {
    match (outcome, mode) {
        (RunOutcome::Cancelled, _) => CANCELLED,
        (RunOutcome::Completed, TestMode::Manual) => MANUAL_DONE,
        (RunOutcome::Completed, TestMode::Automated) => AUTOMATED_DONE,
    }
}

/// Fixed-width field that keeps the first five bytes written to it.
struct Field {
    buf: [u8; FIELD_LEN],
    len: usize,
}

impl Field {
    fn new() -> Self {
        Self { buf: [b' '; FIELD_LEN], len: 0 }
    }
}

impl Write for Field {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            if self.len == FIELD_LEN {
                break;
            }
            self.buf[self.len] = b;
            self.len += 1;
        }
        Ok(())
    }
}

/// `%.3f` cut or space-padded to five bytes.  Unreadable values send dashes.
pub fn voltage_field(volts: f32) -> [u8; FIELD_LEN] {
    let mut f = Field::new();
    // `Field` truncates instead of failing, so these writes are infallible.
    if volts.is_finite() {
        let _ = write!(f, "{volts:.3}");
    } else {
        let _ = f.write_str("-----");
    }
    f.buf
}

/// Integer amps, left-justified and space-padded to five bytes.
pub fn current_field(amps: u16) -> [u8; FIELD_LEN] {
    let mut f = Field::new();
    let _ = write!(f, "{amps}");
    f.buf
}

/// Append to a frame.  `Frame` holds more than the longest reply.
fn put(out: &mut Frame, bytes: &[u8]) {
    let fits = out.extend_from_slice(bytes).is_ok();
    debug_assert!(fits, "reply frame overflow");
}

/// Four voltage fields back to back.
pub fn encode_voltages(volts: &[f32; CELL_COUNT]) -> Frame {
    let mut out = Frame::new();
    for &v in volts {
        put(&mut out, &voltage_field(v));
    }
    out
}

/// Full `r` reply.
pub fn encode_result(result: &TestResult) -> Frame {
    let mut out = Frame::new();
    put(&mut out, b"u");
    put(&mut out, &encode_voltages(&result.unloaded));
    put(&mut out, b"l");
    put(&mut out, &encode_voltages(&result.loaded));
    put(&mut out, b"h");
    for grade in classify_result(result) {
        put(&mut out, grade.code().as_bytes());
    }
    put(&mut out, b"c");
    put(&mut out, &current_field(result.max_load_current));
    out
}

/// Send `bytes` with a fixed pause after each one.
pub fn transmit(serial: &mut impl SerialPort, bytes: &[u8], gap_ms: u32) {
    for &b in bytes {
        serial.write_byte(b);
        serial.pause_ms(gap_ms);
    }
}
