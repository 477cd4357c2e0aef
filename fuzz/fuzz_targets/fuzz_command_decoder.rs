//! Fuzz target: `CommandDecoder::push`
//!
//! Drives arbitrary host bytes through the command decoder and checks
//! that it never panics, that every accepted command is in range, and
//! that a single non-digit byte always returns it to idle.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use quadpack::app::commands::AppCommand;
use quadpack::remote::CommandDecoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = CommandDecoder::new();

    for &byte in data {
        if let Some(Ok(cmd)) = decoder.push(byte) {
            match cmd {
                AppCommand::LoadedTest { amps, .. } => assert!(amps <= 999),
                AppCommand::SendSlot(slot) => assert!((1..=13).contains(&slot.number())),
                _ => {}
            }
        }
    }

    // Any pending field is abandoned by a byte that cannot be a digit.
    let _ = decoder.push(b'z');
    assert!(!decoder.is_mid_command());
});
