//! Compressor power protection: locked rotor and ghost run.
//!
//! Both checks are masked for `inrush_mask_secs` after every start and are
//! skipped entirely when no power reading is available.
//!
//! - Locked rotor: power above `locked_rotor_watts` while running.
//! - Ghost run: power below `ghost_min_watts` for `ghost_trip_secs` while
//!   the relay is on (open motor winding, tripped thermal cut-out, lost
//!   contactor).  Each run counts at most one occurrence; reaching
//!   `ghost_fatal_count` escalates to fatal.  A run that saw normal power
//!   and no ghost resets the count.

use log::{info, warn};

use crate::config::ControllerConfig;

/// Power conditions observed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerVerdict {
    pub locked_rotor: bool,
    pub ghost: bool,
    /// Ghost count reached the escalation threshold.
    pub ghost_fatal: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PowerMonitor {
    was_running: bool,
    ghost_since: Option<u64>,
    ghost_count: u8,
    ghost_counted_this_run: bool,
    normal_power_this_run: bool,
    escalated: bool,
}

impl PowerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        relay_on: bool,
        run_secs: u64,
        power_w: Option<f32>,
        now: u64,
        cfg: &ControllerConfig,
    ) -> PowerVerdict {
        if relay_on && !self.was_running {
            self.ghost_counted_this_run = false;
            self.normal_power_this_run = false;
        } else if !relay_on && self.was_running {
            self.finish_run();
        }
        self.was_running = relay_on;

        let mut verdict = PowerVerdict {
            ghost_fatal: self.escalated,
            ..PowerVerdict::default()
        };

        if !relay_on || run_secs < u64::from(cfg.inrush_mask_secs) {
            self.ghost_since = None;
            return verdict;
        }
        let Some(watts) = power_w.filter(|w| w.is_finite()) else {
            self.ghost_since = None;
            return verdict;
        };

        if watts > cfg.locked_rotor_watts {
            verdict.locked_rotor = true;
        }

        if watts < cfg.ghost_min_watts {
            let since = *self.ghost_since.get_or_insert(now);
            if now.saturating_sub(since) >= u64::from(cfg.ghost_trip_secs) {
                verdict.ghost = true;
                if !self.ghost_counted_this_run {
                    self.ghost_counted_this_run = true;
                    self.ghost_count = self.ghost_count.saturating_add(1);
                    warn!(
                        "Ghost run: {:.0} W with relay on (occurrence {})",
                        watts, self.ghost_count
                    );
                    if self.ghost_count >= cfg.ghost_fatal_count {
                        self.escalated = true;
                    }
                }
            }
        } else {
            self.ghost_since = None;
            if !verdict.locked_rotor {
                self.normal_power_this_run = true;
            }
        }

        verdict.ghost_fatal = self.escalated;
        verdict
    }

    fn finish_run(&mut self) {
        if self.normal_power_this_run && !self.ghost_counted_this_run && self.ghost_count > 0 {
            info!("Clean run completed, ghost count reset");
            self.ghost_count = 0;
        }
        self.ghost_since = None;
    }

    pub fn ghost_count(&self) -> u8 {
        self.ghost_count
    }

    pub fn restore_ghost_count(&mut self, count: u8) {
        self.ghost_count = count;
    }

    /// Clear the escalation after an explicit fatal-alarm reset.
    pub fn clear_escalation(&mut self) {
        self.escalated = false;
        self.ghost_count = 0;
    }
}
