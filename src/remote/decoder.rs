//! Host command decoder.
//!
//! ```text
//!  byte   follow-up          command
//!  ────   ─────────────────  ──────────────────────────────
//!  u      -                  UnloadedTest
//!  m      3 ASCII digits     LoadedTest { Manual, amps }
//!  a      3 ASCII digits     LoadedTest { Automated, amps }
//!  r      -                  SendResult
//!  0      1 ASCII digit      SendSlot(1–9)
//!  1      1 ASCII digit      SendSlot(10–13)
//!  c      -                  Cancel
//! ```
//!
//! Bytes are pushed one at a time, in arrival order, by the single
//! consumer of the serial link.  A multi-byte field is therefore always
//! assembled from consecutive bytes; nothing else can interleave.  There
//! is no framing or resynchronisation: a bad byte inside a field abandons
//! that field and the decoder starts over on the next byte.

use crate::app::commands::AppCommand;
use crate::error::ProtocolError;
use crate::model::{Slot, TestMode};

const CURRENT_DIGITS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    Current { mode: TestMode, value: u16, got: u8 },
    Slot { tens: u8 },
}

#[derive(Debug)]
pub struct CommandDecoder {
    pending: Pending,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecoder {
    pub const fn new() -> Self {
        Self {
            pending: Pending::Idle,
        }
    }

    /// `true` while a command has started but its field is incomplete.
    pub fn is_mid_command(&self) -> bool {
        self.pending != Pending::Idle
    }

    /// Feed one byte.  Returns `Some` when a command completes or fails.
    pub fn push(&mut self, byte: u8) -> Option<Result<AppCommand, ProtocolError>> {
        match self.pending {
            Pending::Idle => match byte {
                b'u' => Some(Ok(AppCommand::UnloadedTest)),
                b'r' => Some(Ok(AppCommand::SendResult)),
                b'c' => Some(Ok(AppCommand::Cancel)),
                b'm' | b'a' => {
                    let mode = if byte == b'm' {
                        TestMode::Manual
                    } else {
                        TestMode::Automated
                    };
                    self.pending = Pending::Current { mode, value: 0, got: 0 };
                    None
                }
                b'0' | b'1' => {
                    self.pending = Pending::Slot { tens: byte - b'0' };
                    None
                }
                other => Some(Err(ProtocolError::UnknownCommand(other))),
            },

            Pending::Current { mode, value, got } => {
                let Some(d) = ascii_digit(byte) else {
                    self.pending = Pending::Idle;
                    return Some(Err(ProtocolError::InvalidDigit(byte)));
                };
                let value = value * 10 + u16::from(d);
                let got = got + 1;
                if got < CURRENT_DIGITS {
                    self.pending = Pending::Current { mode, value, got };
                    return None;
                }
                self.pending = Pending::Idle;
                Some(Ok(AppCommand::LoadedTest { mode, amps: value }))
            }

            Pending::Slot { tens } => {
                self.pending = Pending::Idle;
                let Some(d) = ascii_digit(byte) else {
                    return Some(Err(ProtocolError::InvalidDigit(byte)));
                };
                let number = tens * 10 + d;
                Some(
                    Slot::from_number(number)
                        .map(AppCommand::SendSlot)
                        .ok_or(ProtocolError::SlotOutOfRange(number)),
                )
            }
        }
    }
}

fn ascii_digit(byte: u8) -> Option<u8> {
    if byte.is_ascii_digit() { Some(byte - b'0') } else { None }
}
