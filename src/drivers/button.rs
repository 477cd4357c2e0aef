//! ISR-debounced front-panel buttons.
//!
//! ## Hardware
//!
//! Four active-low momentary switches with pull-ups.  Each GPIO fires on
//! its falling edge; the ISR debounces against the last accepted edge of
//! the same button and pushes the press into the input queue.
//!
//! BACK additionally raises the cancellation token straight from the ISR,
//! so a running test sees it at its next step even before the main loop
//! drains the queue.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::control::{CANCEL, CancelToken};
use crate::events::{ButtonPress, push_event};

/// Edges closer than this to the previous accepted edge are bounce.
pub const DEBOUNCE_MS: u32 = 50;

/// Per-button timestamp of the last accepted edge.
pub struct Debouncer {
    last_ms: [AtomicU32; 4],
    armed: [AtomicBool; 4],
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            last_ms: [const { AtomicU32::new(0) }; 4],
            armed: [const { AtomicBool::new(false) }; 4],
        }
    }

    /// `true` if this edge is a genuine press.
    pub fn accept(&self, press: ButtonPress, now_ms: u32) -> bool {
        let i = press as usize;
        let seen = self.armed[i].swap(true, Ordering::AcqRel);
        let last = self.last_ms[i].load(Ordering::Acquire);
        if seen && now_ms.wrapping_sub(last) < DEBOUNCE_MS {
            return false;
        }
        self.last_ms[i].store(now_ms, Ordering::Release);
        true
    }
}

static DEBOUNCER: Debouncer = Debouncer::new();

/// Side effect of an accepted press that must not wait for the main loop.
pub fn raise_cancel_on_back(press: ButtonPress, cancel: &CancelToken) {
    if press == ButtonPress::Back {
        cancel.request();
    }
}

/// ISR handler: register on every button's falling edge.
/// Safe to call from interrupt context.
pub fn button_isr_handler(press: ButtonPress, now_ms: u32) {
    if DEBOUNCER.accept(press, now_ms) {
        raise_cancel_on_back(press, &CANCEL);
        // A full queue drops the press; BACK has already raised the token.
        let _ = push_event(press);
    }
}
