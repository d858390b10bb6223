//! Freeze protection.
//!
//! Locks the compressor off once the cabinet air falls to the cut-off.
//! The lock releases only after the air has stayed strictly above
//! `cutoff + recovery_hyst` for the whole recovery delay; dipping back
//! below restarts the delay.

use log::{info, warn};

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Default)]
pub struct FreezeGuard {
    locked: bool,
    lock_count: u32,
    /// Start of the current continuous stretch above the release level.
    above_since: Option<u64>,
}

impl FreezeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate against the air decision value.  A missing value leaves the
    /// lock unchanged.  Returns the lock state.
    pub fn update(&mut self, air: Option<f32>, now: u64, cfg: &ControllerConfig) -> bool {
        let Some(air) = air else {
            return self.locked;
        };

        if !self.locked {
            if air <= cfg.freeze_cutoff_c {
                self.locked = true;
                self.lock_count = self.lock_count.saturating_add(1);
                self.above_since = None;
                warn!(
                    "Freeze lock engaged at {:.2}°C (lock #{})",
                    air, self.lock_count
                );
            }
            return self.locked;
        }

        let release_level = cfg.freeze_cutoff_c + cfg.freeze_recovery_hyst_c;
        if air > release_level {
            let since = *self.above_since.get_or_insert(now);
            if now.saturating_sub(since) >= u64::from(cfg.freeze_recovery_secs) {
                self.locked = false;
                self.above_since = None;
                info!("Freeze lock released at {:.2}°C", air);
            }
        } else {
            self.above_since = None;
        }
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    pub fn restore_lock_count(&mut self, count: u32) {
        self.lock_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_at_cutoff_and_counts_once() {
        let c = ControllerConfig::default();
        let mut f = FreezeGuard::new();
        assert!(!f.update(Some(1.0), 0, &c));
        assert!(f.update(Some(0.5), 5, &c));
        assert!(f.update(Some(0.2), 10, &c));
        assert_eq!(f.lock_count(), 1);
    }

    #[test]
    fn release_needs_full_delay_above_level() {
        let c = ControllerConfig::default();
        let mut f = FreezeGuard::new();
        f.update(Some(0.0), 0, &c);
        // 1.5 is the release level; must be strictly above
        assert!(f.update(Some(1.5), 10, &c));
        assert!(f.update(Some(1.6), 20, &c));
        assert!(f.update(Some(1.8), 300, &c));
        // dip restarts the delay
        assert!(f.update(Some(1.4), 310, &c));
        assert!(f.update(Some(1.7), 320, &c));
        assert!(f.update(Some(1.7), 619, &c));
        assert!(!f.update(Some(1.7), 620, &c));
    }

    #[test]
    fn missing_reading_keeps_lock() {
        let c = ControllerConfig::default();
        let mut f = FreezeGuard::new();
        f.update(Some(0.0), 0, &c);
        assert!(f.update(None, 1_000, &c));
    }
}
