//! Cooperative cancellation token.
//!
//! Set from interrupt context (BACK button) or by the remote session when
//! the host sends a cancel byte; consumed by whichever control loop is
//! running at its next iteration boundary.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-writer/single-reader cancellation flag.
pub struct CancelToken(AtomicBool);

impl CancelToken {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Ask the active loop to stop.  Safe to call from an ISR.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Consume a pending request, returning whether there was one.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide token raised by the button ISR.
pub static CANCEL: CancelToken = CancelToken::new();
