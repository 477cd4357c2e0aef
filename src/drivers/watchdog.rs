//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the main task to the ESP-IDF TWDT.  The main loop feeds it
//! once per iteration; a test step that wedges the loop for longer than
//! the timeout resets the board with the stepper driver asleep.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use log::{info, warn};

pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: AtomicU32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn new(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls; a null handle means "the current task".
        let subscribed = unsafe {
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("WDT: reconfigure returned {} (may already be configured)", ret);
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK
        };
        if subscribed {
            info!("WDT: subscribed ({} ms, panic on trigger)", timeout_ms);
        } else {
            warn!("WDT: failed to subscribe");
        }
        Self {
            timeout_ms,
            subscribed,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        info!("WDT(sim): {} ms, no-op", timeout_ms);
        Self {
            timeout_ms,
            subscribed: true,
            feeds: AtomicU32::new(0),
        }
    }

    /// Feed the watchdog.  Must be called at least once per timeout.
    pub fn feed(&self) {
        if !self.subscribed {
            return;
        }
        #[cfg(target_os = "espidf")]
        unsafe {
            esp_task_wdt_reset();
        }
        #[cfg(not(target_os = "espidf"))]
        self.feeds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Number of feeds since construction (host builds only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feed_count(&self) -> u32 {
        self.feeds.load(Ordering::Relaxed)
    }
}
