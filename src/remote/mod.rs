//! Host serial protocol: a second front end over the same tester core.
//!
//! [`RemoteSession`] pulls bytes from the [`SerialPort`] and hands
//! complete commands to the service.  Replies are framed by [`reply`].

pub mod decoder;
pub mod reply;

use log::debug;

pub use decoder::CommandDecoder;

use crate::app::commands::AppCommand;
use crate::app::ports::SerialPort;
use crate::error::ProtocolError;

/// Byte pump between the serial link and the decoder.
#[derive(Debug, Default)]
pub struct RemoteSession {
    decoder: CommandDecoder,
}

impl RemoteSession {
    pub const fn new() -> Self {
        Self {
            decoder: CommandDecoder::new(),
        }
    }

    /// Read waiting bytes until one command completes or fails.  Bytes
    /// after it stay in the link for the next call.  A half-received field
    /// survives across calls.
    pub fn poll(
        &mut self,
        serial: &mut impl SerialPort,
    ) -> Option<Result<AppCommand, ProtocolError>> {
        while let Some(byte) = serial.read_byte() {
            if let Some(decoded) = self.decoder.push(byte) {
                debug!("REMOTE: 0x{byte:02x} -> {:?}", decoded);
                return Some(decoded);
            }
        }
        None
    }

    #[cfg(test)]
    fn is_mid_command(&self) -> bool {
        self.decoder.is_mid_command()
    }
}
