//! Host serial link adapter.
//!
//! - **`target_os = "espidf"`**: a UART driver polled without blocking;
//!   inter-byte pauses use the FreeRTOS delay.
//! - **`not(target_os = "espidf")`**: in-memory receive and transmit
//!   queues for host-side simulation.

use crate::app::ports::SerialPort;

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{delay::FreeRtos, delay::NON_BLOCK, uart::UartDriver};
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
pub struct HostLink {
    uart: UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl HostLink {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl SerialPort for HostLink {
    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.uart.read(&mut buf, NON_BLOCK) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_byte(&mut self, byte: u8) {
        if let Err(e) = self.uart.write(&[byte]) {
            warn!("SERIAL: tx failed: {}", e);
        }
    }

    fn pause_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

/// Simulated link: the test pushes host bytes in and takes replies out.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct HostLink {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    paused_ms: u64,
}

#[cfg(not(target_os = "espidf"))]
impl HostLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the host had sent them.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Everything transmitted since the last call.
    pub fn take_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// Total inter-byte pause requested so far.
    pub fn paused_ms(&self) -> u64 {
        self.paused_ms
    }
}

#[cfg(not(target_os = "espidf"))]
impl SerialPort for HostLink {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn pause_ms(&mut self, ms: u32) {
        self.paused_ms += u64::from(ms);
    }
}
