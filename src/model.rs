//! Test records and the fixed on-medium layout used by the result store.
//!
//! ```text
//!  offset  size  field
//!  ──────  ────  ─────────────────────────────
//!   0      16    unloaded voltages  4 × f32 LE
//!  16      16    loaded voltages    4 × f32 LE
//!  32       2    max load current   u16 LE
//!  34       1    test mode          0 = manual, 1 = automated
//!  35       1    ambient temp       °C
//!  36       3    date               yy, mm, dd
//!  ──────  ────
//!          39
//! ```

use serde::{Deserialize, Serialize};

/// Number of cells in a quad-pack.
pub const CELL_COUNT: usize = 4;

/// Encoded size of one [`TestResult`].
pub const RECORD_LEN: usize = 39;

/// Number of persistent result slots.
pub const SLOT_COUNT: usize = 13;

// ───────────────────────────────────────────────────────────────
// Test mode
// ───────────────────────────────────────────────────────────────

/// How the discharge current was brought to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestMode {
    /// The operator turns the carbon-pile knob by hand.
    Manual,
    /// The stepper drives the knob.
    #[default]
    Automated,
}

impl TestMode {
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Manual => 0x00,
            Self::Automated => 0x01,
        }
    }

    /// Any non-zero byte reads back as automated.
    pub const fn from_byte(b: u8) -> Self {
        if b == 0 { Self::Manual } else { Self::Automated }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Manual => Self::Automated,
            Self::Automated => Self::Manual,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Automated => "Automated",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Date
// ───────────────────────────────────────────────────────────────

/// Calendar date with a two-digit year (2000-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestDate {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

// ───────────────────────────────────────────────────────────────
// Test result
// ───────────────────────────────────────────────────────────────

/// One completed (or in-progress) quad-pack test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TestResult {
    /// Cell voltages with no discharge current, cell 1 first.
    pub unloaded: [f32; CELL_COUNT],
    /// Cell voltages sampled at the regulated current.
    pub loaded: [f32; CELL_COUNT],
    /// Discharge current achieved (amps).
    pub max_load_current: u16,
    pub test_mode: TestMode,
    /// Ambient temperature during the test (°C).
    pub ambient_temp: u8,
    pub date: TestDate,
}

impl TestResult {
    /// Encode into the fixed 39-byte record.
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        for (i, v) in self.unloaded.iter().chain(self.loaded.iter()).enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        out[32..34].copy_from_slice(&self.max_load_current.to_le_bytes());
        out[34] = self.test_mode.as_byte();
        out[35] = self.ambient_temp;
        out[36] = self.date.year;
        out[37] = self.date.month;
        out[38] = self.date.day;
        out
    }

    /// Decode a 39-byte record.  Every bit pattern decodes; an erased slot
    /// (all `0xFF`) yields NaN voltages.
    pub fn from_bytes(raw: &[u8; RECORD_LEN]) -> Self {
        let f = |i: usize| f32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        Self {
            unloaded: [f(0), f(4), f(8), f(12)],
            loaded: [f(16), f(20), f(24), f(28)],
            max_load_current: u16::from_le_bytes([raw[32], raw[33]]),
            test_mode: TestMode::from_byte(raw[34]),
            ambient_temp: raw[35],
            date: TestDate {
                year: raw[36],
                month: raw[37],
                day: raw[38],
            },
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Slot
// ───────────────────────────────────────────────────────────────

/// Index into the persistent store, guaranteed to be in range.
///
/// Slots are numbered 1–13 on screen and on the wire; the index is 0–12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Slot(u8);

impl Slot {
    pub const FIRST: Self = Self(0);
    pub const LAST: Self = Self(SLOT_COUNT as u8 - 1);

    /// From a zero-based index.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SLOT_COUNT { Some(Self(index)) } else { None }
    }

    /// From a one-based quad-pack number.
    pub const fn from_number(number: u8) -> Option<Self> {
        if number == 0 { None } else { Self::new(number - 1) }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn number(self) -> u8 {
        self.0 + 1
    }

    /// Next slot, clamped at the last.
    pub const fn next(self) -> Self {
        if self.0 < Self::LAST.0 { Self(self.0 + 1) } else { self }
    }

    /// Previous slot, clamped at the first.
    pub const fn prev(self) -> Self {
        if self.0 > 0 { Self(self.0 - 1) } else { self }
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT as u8).map(Slot)
    }
}
