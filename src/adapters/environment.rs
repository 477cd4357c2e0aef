//! Ambient conditions adapter.
//!
//! Supplies the temperature and date stamped into every completed result.
//!
//! - Temperature is the bench ambient configured at build time; the board
//!   has no ambient sensor.
//! - **`target_os = "espidf"`**: the date comes from the system wall
//!   clock (`gettimeofday` + `localtime_r`).  A clock that was never set
//!   reads as 1970 and yields the zero date.
//! - **`not(target_os = "espidf")`**: `std::time::SystemTime`, or a
//!   pinned date for deterministic tests.

use crate::app::ports::EnvironmentPort;
use crate::model::TestDate;

pub const DEFAULT_AMBIENT_C: u8 = 22;

/// Seconds at 2020-01-01T00:00:00Z.  Anything earlier is an unset clock.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct Esp32Environment {
    ambient_c: u8,
    #[cfg(not(target_os = "espidf"))]
    pinned: Option<TestDate>,
}

impl Default for Esp32Environment {
    fn default() -> Self {
        Self::new(DEFAULT_AMBIENT_C)
    }
}

impl Esp32Environment {
    pub fn new(ambient_c: u8) -> Self {
        Self {
            ambient_c,
            #[cfg(not(target_os = "espidf"))]
            pinned: None,
        }
    }

    /// Always report `date` instead of the host clock.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_date(mut self, date: TestDate) -> Self {
        self.pinned = Some(date);
        self
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock_date(&self) -> Option<TestDate> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        Some(TestDate {
            year: (tm.tm_year - 100).clamp(0, 99) as u8,
            month: (tm.tm_mon + 1) as u8,
            day: tm.tm_mday as u8,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock_date(&self) -> Option<TestDate> {
        if let Some(d) = self.pinned {
            return Some(d);
        }
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs() as i64;
        if secs < EPOCH_2020 {
            return None;
        }
        Some(date_from_unix_days(secs.div_euclid(86_400)))
    }
}

impl EnvironmentPort for Esp32Environment {
    fn ambient_temp_c(&mut self) -> u8 {
        self.ambient_c
    }

    fn today(&mut self) -> TestDate {
        self.wall_clock_date().unwrap_or_default()
    }
}

/// Civil date for a day count since 1970-01-01 (proleptic Gregorian).
#[cfg(not(target_os = "espidf"))]
fn date_from_unix_days(days: i64) -> TestDate {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    TestDate {
        year: (year - 2000).clamp(0, 99) as u8,
        month: month as u8,
        day: day as u8,
    }
}
