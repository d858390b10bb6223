//! ESP32 clock adapter.
//!
//! Implements [`ClockPort`] for the controller.
//!
//! - **`target_os = "espidf"`**: monotonic time from `esp_timer_get_time()`
//!   (microsecond precision), wall time from `gettimeofday()` once SNTP or
//!   the RTC has set it.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side simulation.

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means the wall clock was never set.
const EPOCH_2020: u64 = 1_577_836_800;

/// Clock adapter for the ESP32-S3 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: plain read of the high-resolution timer counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn wall_raw(&self) -> Option<u64> {
        let mut tv = esp_idf_svc::sys::timeval { tv_sec: 0, tv_usec: 0 };
        // SAFETY: tv is a valid out-pointer; the timezone argument may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        u64::try_from(tv.tv_sec).ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_raw(&self) -> Option<u64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}

impl ClockPort for Esp32Clock {
    fn monotonic_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }

    fn wall_secs(&self) -> Option<u64> {
        self.wall_raw().filter(|&secs| secs >= EPOCH_2020)
    }

    /// Local hour-of-day using the TZ configured in ESP-IDF.
    #[cfg(target_os = "espidf")]
    fn local_hour(&self) -> Option<u8> {
        let secs = self.wall_secs()? as esp_idf_svc::sys::time_t;
        // SAFETY: tm is plain-old-data; localtime_r fills it or returns null.
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        u8::try_from(tm.tm_hour).ok().filter(|h| *h <= 23)
    }

    /// UTC hour on the host.
    #[cfg(not(target_os = "espidf"))]
    fn local_hour(&self) -> Option<u8> {
        self.wall_secs().map(|secs| ((secs / 3600) % 24) as u8)
    }
}
