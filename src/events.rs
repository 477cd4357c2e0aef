//! Interrupt-driven input queue.
//!
//! Button ISRs produce presses; the main loop drains them once per
//! iteration and feeds them to the application service one at a time.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ OK ISR      │────▶│              │     │              │
//! │ BACK ISR    │────▶│  Input Queue │────▶│  Main Loop   │
//! │ UP ISR      │────▶│  (bounded)   │     │  (consumer)  │
//! │ DOWN ISR    │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue lives behind a `critical_section::Mutex`, so pushes from an
//! ISR and pops from the main loop never interleave.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Maximum number of pending presses.
const INPUT_QUEUE_CAP: usize = 16;

/// The four front-panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ButtonPress {
    Ok = 0,
    Back = 1,
    Up = 2,
    Down = 3,
}

impl ButtonPress {
    pub const ALL: [ButtonPress; 4] = [Self::Ok, Self::Back, Self::Up, Self::Down];

    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Ok),
            1 => Some(Self::Back),
            2 => Some(Self::Up),
            3 => Some(Self::Down),
            _ => None,
        }
    }
}

static INPUT_QUEUE: Mutex<RefCell<Deque<ButtonPress, INPUT_QUEUE_CAP>>> =
    Mutex::new(RefCell::new(Deque::new()));

/// Push a press into the queue.  Safe to call from ISR context.
/// Returns `false` if the queue is full (press dropped).
pub fn push_event(press: ButtonPress) -> bool {
    critical_section::with(|cs| INPUT_QUEUE.borrow_ref_mut(cs).push_back(press).is_ok())
}

/// Pop the oldest pending press.
pub fn pop_event() -> Option<ButtonPress> {
    critical_section::with(|cs| INPUT_QUEUE.borrow_ref_mut(cs).pop_front())
}

/// Drain all pending presses into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(ButtonPress)) {
    while let Some(press) = pop_event() {
        handler(press);
    }
}

#[cfg(test)]
fn queue_is_empty() -> bool {
    critical_section::with(|cs| INPUT_QUEUE.borrow_ref(cs).is_empty())
}

#[cfg(test)]
fn queue_len() -> usize {
    critical_section::with(|cs| INPUT_QUEUE.borrow_ref(cs).len())
}
