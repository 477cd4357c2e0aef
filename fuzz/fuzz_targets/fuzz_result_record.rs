//! Fuzz target: `TestResult::from_bytes` and the host result frame
//!
//! Any 39 bytes read back from a slot, erased or garbage, must decode and
//! re-encode into a full-length result frame without panicking.
//!
//! cargo fuzz run fuzz_result_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use quadpack::config::VoltagePrecision;
use quadpack::model::{RECORD_LEN, TestResult};
use quadpack::remote::reply::{RESULT_FRAME_LEN, encode_result};
use quadpack::ui::screens::{conditions_view, health_view, voltage_view};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = <[u8; RECORD_LEN]>::try_from(data) else {
        return;
    };
    let result = TestResult::from_bytes(&raw);

    assert_eq!(encode_result(&result).len(), RESULT_FRAME_LEN);

    let _ = voltage_view(&result, VoltagePrecision::High);
    let _ = health_view(&result);
    let _ = conditions_view(&result);
});
