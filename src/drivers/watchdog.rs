//! Loop-stall watchdog.
//!
//! On target this subscribes the main task to the ESP-IDF Task Watchdog
//! (TWDT), which panics and resets the chip when the loop stops feeding
//! it.  A reset leaves the relay coil de-energised, so a hung loop can
//! never hold the compressor on.
//!
//! On the host the same API tracks the last feed time so tests and the
//! simulation can detect a starved loop.

use core::cell::Cell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Default stall timeout: several control ticks plus a slow NVS commit.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    timeout_ms: u32,
    feeds: Cell<u64>,
    #[cfg(target_os = "espidf")]
    armed: bool,
    #[cfg(not(target_os = "espidf"))]
    last_feed: Cell<std::time::Instant>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let armed = arm_twdt(timeout_ms);
            Self {
                timeout_ms,
                feeds: Cell::new(0),
                armed,
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms stall limit", timeout_ms);
            Self {
                timeout_ms,
                feeds: Cell::new(0),
                last_feed: Cell::new(std::time::Instant::now()),
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Number of feeds since construction.
    pub fn feeds(&self) -> u64 {
        self.feeds.get()
    }

    /// Feed the watchdog.  Must be called at least once per timeout.
    pub fn feed(&self) {
        self.feeds.set(self.feeds.get().wrapping_add(1));

        #[cfg(target_os = "espidf")]
        if self.armed {
            // SAFETY: resets the TWDT entry of the calling (main) task.
            unsafe {
                esp_task_wdt_reset();
            }
        }

        #[cfg(not(target_os = "espidf"))]
        self.last_feed.set(std::time::Instant::now());
    }

    /// Time since the last feed exceeds the timeout.  On target the TWDT
    /// would already have reset the chip, so this is always `false`.
    pub fn is_starved(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            false
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.last_feed.get().elapsed().as_millis() > u128::from(self.timeout_ms)
        }
    }
}

/// Reconfigure the TWDT and subscribe the calling task.  Returns whether
/// the subscription succeeded.
#[cfg(target_os = "espidf")]
fn arm_twdt(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: called once from the main task at boot.
    let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if ret != ESP_OK {
        log::warn!("Watchdog: TWDT reconfigure returned {} (already configured?)", ret);
    }

    // SAFETY: a null handle subscribes the calling task.
    let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if ret == ESP_OK {
        log::info!("Watchdog: armed, {} ms stall limit", timeout_ms);
        true
    } else {
        log::warn!("Watchdog: subscribe failed ({}), loop stalls go undetected", ret);
        false
    }
}
