//! Loaded-voltage health grading.
//!
//! Grades step down one notch for every 0.1 V the loaded cell voltage sits
//! below 2.9 V:
//!
//! ```text
//!         v ≥ 2.9  A+     2.4 ≤ v < 2.5  B-     1.9 ≤ v < 2.0  D
//!   2.8 ≤ v < 2.9  A      2.3 ≤ v < 2.4  C+     1.8 ≤ v < 1.9  D-
//!   2.7 ≤ v < 2.8  A-     2.2 ≤ v < 2.3  C            v < 1.8  F
//!   2.6 ≤ v < 2.7  B+     2.1 ≤ v < 2.2  C-
//!   2.5 ≤ v < 2.6  B      2.0 ≤ v < 2.1  D+
//! ```

use core::fmt;

use crate::model::{CELL_COUNT, TestResult};

/// Threshold of the top grade, in tenths of a volt.
const TOP_TENTHS: u8 = 29;
/// The walk stops once the threshold drops to 1.7 V.
const FLOOR_TENTHS: u8 = 17;

/// Health grade, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Grade {
    APlus = 0,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

impl Grade {
    pub const COUNT: usize = 13;

    const ALL: [Grade; Self::COUNT] = [
        Self::APlus,
        Self::A,
        Self::AMinus,
        Self::BPlus,
        Self::B,
        Self::BMinus,
        Self::CPlus,
        Self::C,
        Self::CMinus,
        Self::DPlus,
        Self::D,
        Self::DMinus,
        Self::F,
    ];

    /// Grade at `rank` (0 = A+), saturating at F.
    pub fn from_rank(rank: usize) -> Self {
        Self::ALL[rank.min(Self::COUNT - 1)]
    }

    /// Two-character code as shown on screen and sent to the host.
    pub const fn code(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A ",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B ",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C ",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D ",
            Self::DMinus => "D-",
            Self::F => "F ",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().trim_end())
    }
}

/// Grade a single loaded cell voltage.
///
/// Non-finite readings (open tap, erased record) grade as F.
pub fn classify(loaded_voltage: f32) -> Grade {
    if !loaded_voltage.is_finite() {
        return Grade::F;
    }
    let mut rank = 0usize;
    let mut tenths = TOP_TENTHS;
    while tenths >= FLOOR_TENTHS && loaded_voltage < f32::from(tenths) / 10.0 {
        rank += 1;
        tenths -= 1;
    }
    Grade::from_rank(rank)
}

/// Grade all four cells of a result.
pub fn classify_result(result: &TestResult) -> [Grade; CELL_COUNT] {
    result.loaded.map(classify)
}
