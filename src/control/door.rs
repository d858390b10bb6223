//! Door-open detection from the cabinet air rate of rise.
//!
//! Works on the raw air sample: a door opening shows up as a fast step,
//! which the median filter would hide.

use log::info;

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Default)]
pub struct DoorDetector {
    reference_c: Option<f32>,
    reference_at: u64,
    pause_remaining_secs: u64,
}

impl DoorDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick of `dt_secs`.  Returns `true` while the door pause
    /// is running.
    pub fn update(
        &mut self,
        raw_air: Option<f32>,
        now: u64,
        dt_secs: u64,
        cfg: &ControllerConfig,
    ) -> bool {
        self.pause_remaining_secs = self.pause_remaining_secs.saturating_sub(dt_secs);

        if let Some(air) = raw_air.filter(|a| a.is_finite()) {
            match self.reference_c {
                None => self.resample(air, now),
                Some(reference) => {
                    let elapsed = now.saturating_sub(self.reference_at);
                    if elapsed >= u64::from(cfg.door_min_sample_secs) && elapsed > 0 {
                        let rate = (air - reference) / (elapsed as f32 / 60.0);
                        if rate > cfg.door_rate_c_per_min {
                            if self.pause_remaining_secs == 0 {
                                info!("Door open suspected: +{:.2}°C/min", rate);
                            }
                            self.pause_remaining_secs = u64::from(cfg.door_pause_secs);
                        }
                    }
                    if elapsed >= u64::from(cfg.door_window_secs) {
                        self.resample(air, now);
                    }
                }
            }
        }

        self.pause_remaining_secs > 0
    }

    pub fn is_paused(&self) -> bool {
        self.pause_remaining_secs > 0
    }

    pub fn pause_remaining_secs(&self) -> u64 {
        self.pause_remaining_secs
    }

    fn resample(&mut self, air: f32, now: u64) {
        self.reference_c = Some(air);
        self.reference_at = now;
    }
}
