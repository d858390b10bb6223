//! Per-sensor health monitor: offline, critical and stuck detection.
//!
//! ```text
//!  valid ──[no reading ≥ no_reading_secs]──▶ OFFLINE (warning)
//!                                               │
//!                          [no reading ≥ critical_secs]
//!                                               ▼
//!  valid ◀────────[first valid reading]──── CRITICAL
//! ```
//!
//! Stuck detection runs on valid readings only: a reference value is
//! latched on the first reading and re-latched whenever the reading moves
//! by more than `stuck_epsilon_c`.  No movement for `stuck_secs` → stuck.
//! Any later movement clears it.

use log::{error, info, warn};

use crate::config::ControllerConfig;

/// What changed in a sensor's health during one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    /// Nothing changed.
    Steady,
    /// Soft offline flag raised.
    WentOffline,
    /// Critical failure raised.
    WentCritical,
    /// A valid reading returned after an offline or critical period.
    Recovered,
    /// The reading has not moved for the stuck window.
    BecameStuck,
    /// A previously stuck reading moved again.
    Unstuck,
}

/// Health state for one temperature probe.
#[derive(Debug, Clone)]
pub struct SensorHealth {
    name: &'static str,
    /// Last valid reading time, or the monitor start time before the first.
    last_valid_at: u64,
    reference_c: Option<f32>,
    last_change_at: u64,
    offline: bool,
    critical: bool,
    stuck: bool,
}

impl SensorHealth {
    /// Start monitoring at `now`; the no-reading timers count from here.
    pub fn new(name: &'static str, now: u64) -> Self {
        Self {
            name,
            last_valid_at: now,
            reference_c: None,
            last_change_at: now,
            offline: false,
            critical: false,
            stuck: false,
        }
    }

    /// Feed this tick's sample (`None` = missing or invalid).
    pub fn observe(
        &mut self,
        reading: Option<f32>,
        now: u64,
        cfg: &ControllerConfig,
    ) -> HealthTransition {
        match reading {
            Some(value) if value.is_finite() => self.observe_valid(value, now, cfg),
            _ => self.observe_missing(now, cfg),
        }
    }

    fn observe_missing(&mut self, now: u64, cfg: &ControllerConfig) -> HealthTransition {
        let silent = now.saturating_sub(self.last_valid_at);

        if !self.critical && silent >= u64::from(cfg.critical_secs) {
            self.critical = true;
            self.offline = true;
            error!("SENSOR CRITICAL: {} silent for {}s", self.name, silent);
            return HealthTransition::WentCritical;
        }
        if !self.offline && silent >= u64::from(cfg.no_reading_secs) {
            self.offline = true;
            warn!("Sensor offline: {} silent for {}s", self.name, silent);
            return HealthTransition::WentOffline;
        }
        HealthTransition::Steady
    }

    fn observe_valid(&mut self, value: f32, now: u64, cfg: &ControllerConfig) -> HealthTransition {
        self.last_valid_at = now;

        let recovered = self.offline || self.critical;
        if recovered {
            info!("Sensor recovered: {} = {:.2}°C", self.name, value);
            self.offline = false;
            self.critical = false;
        }

        let moved = self
            .reference_c
            .is_none_or(|r| (value - r).abs() > cfg.stuck_epsilon_c);

        if moved {
            self.reference_c = Some(value);
            self.last_change_at = now;
            if self.stuck {
                self.stuck = false;
                info!("Sensor {} moving again", self.name);
                if !recovered {
                    return HealthTransition::Unstuck;
                }
            }
        } else if !self.stuck
            && now.saturating_sub(self.last_change_at) >= u64::from(cfg.stuck_secs)
        {
            self.stuck = true;
            warn!(
                "Sensor stuck: {} unchanged at {:.2}°C for {}s",
                self.name,
                value,
                now.saturating_sub(self.last_change_at)
            );
            if !recovered {
                return HealthTransition::BecameStuck;
            }
        }

        if recovered {
            HealthTransition::Recovered
        } else {
            HealthTransition::Steady
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    /// Neither offline, critical nor stuck.
    pub fn is_healthy(&self) -> bool {
        !self.offline && !self.critical && !self.stuck
    }

    /// Seconds since the last valid reading.
    pub fn silent_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_valid_at)
    }
}
