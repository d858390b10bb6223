//! Limp mode: blind duty cycling when the air probe cannot be trusted.
//!
//! The compressor runs `limp_on_secs`, rests `limp_off_secs`, and repeats,
//! purely as a function of uptime.  Entered while `SENSOR_FAIL` or
//! `SENSOR_STUCK` is active; left as soon as the air probe recovers.

use log::{info, warn};

use crate::config::ControllerConfig;

/// Duty-cycle decision for a given uptime.
pub fn limp_wants_on(uptime_secs: u64, cfg: &ControllerConfig) -> bool {
    let on = u64::from(cfg.limp_on_secs);
    let period = on + u64::from(cfg.limp_off_secs);
    if period == 0 {
        return false;
    }
    uptime_secs % period < on
}

/// Tracks entry into and exit from limp mode.
#[derive(Debug, Clone, Default)]
pub struct LimpMode {
    active: bool,
    entered_at: u64,
}

impl LimpMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sensor_unusable: bool, now: u64) -> bool {
        if sensor_unusable && !self.active {
            warn!("Entering limp mode (air sensor unusable)");
            self.active = true;
            self.entered_at = now;
        } else if !sensor_unusable && self.active {
            info!("Leaving limp mode after {}s", now.saturating_sub(self.entered_at));
            self.active = false;
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
