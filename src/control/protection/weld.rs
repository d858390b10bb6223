//! Relay weld detection.
//!
//! Fused contacts keep the compressor running after the relay is released,
//! so the cabinet keeps getting colder.  On every accepted OFF the air
//! value is snapshotted.  After `weld_wait_secs` (thermal lag) and until
//! `weld_wait_secs + weld_window_secs`, a drop of more than `weld_drop_c`
//! below the snapshot flags a weld.

use log::error;

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Default)]
pub struct WeldDetector {
    snapshot_c: Option<f32>,
    off_at: u64,
}

impl WeldDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The relay was just commanded off.
    pub fn on_relay_off(&mut self, air: Option<f32>, now: u64) {
        self.snapshot_c = air;
        self.off_at = now;
    }

    /// The relay was commanded on, or state was resynchronised.
    pub fn reset(&mut self) {
        self.snapshot_c = None;
    }

    /// Returns `true` when a weld is suspected this tick.
    pub fn update(
        &mut self,
        relay_on: bool,
        air: Option<f32>,
        now: u64,
        cfg: &ControllerConfig,
    ) -> bool {
        if relay_on {
            self.snapshot_c = None;
            return false;
        }
        let Some(snapshot) = self.snapshot_c else {
            return false;
        };

        let elapsed = now.saturating_sub(self.off_at);
        let wait = u64::from(cfg.weld_wait_secs);
        if elapsed < wait {
            return false;
        }
        if elapsed > wait + u64::from(cfg.weld_window_secs) {
            self.snapshot_c = None;
            return false;
        }

        match air {
            Some(a) if snapshot - a > cfg.weld_drop_c => {
                error!(
                    "Weld suspected: air {:.2}°C is {:.2}°C below the turn-off value {:.2}°C",
                    a,
                    snapshot - a,
                    snapshot
                );
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> Option<f32> {
        self.snapshot_c
    }
}
