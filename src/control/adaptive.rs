//! Adaptive hysteresis tuner.
//!
//! Watches compressor cycling over fixed windows and shifts the thermostat
//! band outwards when cycles are short (protecting the compressor) or
//! inwards when they are long (tighter temperature control).  The shift
//! applies to both thresholds: effective hysteresis = base + shift.
//!
//! | Avg cycle           | Class    | Action                               |
//! |---------------------|----------|--------------------------------------|
//! | < 15 min            | Danger   | +0.3 °C immediately                  |
//! | < 18 min            | Widen    | +0.2 °C after 2 consecutive signals  |
//! | 18 – 28 min         | Stable   | reset counter                        |
//! | > 28 min, off > on  | Tighten  | −0.2 °C after 2 consecutive signals  |

use log::{debug, info, warn};

use crate::config::ControllerConfig;

const DANGER_STEP_C: f32 = 0.3;
const WIDEN_STEP_C: f32 = 0.2;
const TIGHTEN_STEP_C: f32 = 0.2;
const CONFIRMATIONS: u8 = 2;

const DANGER_MIN: f32 = 15.0;
const WIDEN_MIN: f32 = 18.0;
const TIGHTEN_MIN: f32 = 28.0;
// Hour-boundary compensation
const BUSY_CYCLES_PER_HOUR: f32 = 5.0;
const BUSY_AVG_MIN: f32 = 20.0;
const SLOW_CYCLES_PER_HOUR: f32 = 3.0;
const SLOW_AVG_MIN: f32 = 25.0;

/// Classification of one evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleClass {
    Danger,
    Widen,
    Stable,
    Tighten,
}

/// Classify a window.  `None` when no cycle completed.
pub fn classify(on_secs: u64, off_secs: u64, cycles: u32, window_secs: u64) -> Option<CycleClass> {
    if cycles == 0 || window_secs == 0 {
        return None;
    }
    let avg_min = (on_secs + off_secs) as f32 / cycles as f32 / 60.0;
    let per_hour = cycles as f32 * 3_600.0 / window_secs as f32;

    let class = if avg_min < DANGER_MIN || (per_hour >= BUSY_CYCLES_PER_HOUR && avg_min < BUSY_AVG_MIN) {
        CycleClass::Danger
    } else if avg_min < WIDEN_MIN {
        CycleClass::Widen
    } else if (avg_min > TIGHTEN_MIN && off_secs > on_secs)
        || (per_hour <= SLOW_CYCLES_PER_HOUR && avg_min > SLOW_AVG_MIN)
    {
        CycleClass::Tighten
    } else {
        CycleClass::Stable
    };
    Some(class)
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveTuner {
    shift_c: f32,
    on_secs: u64,
    off_secs: u64,
    cycles: u32,
    window_start: u64,
    last_adjust_at: Option<u64>,
    loop_count: u32,
    pending_direction: Option<CycleClass>,
    pending_count: u8,
}

impl AdaptiveTuner {
    pub fn new(now: u64) -> Self {
        Self {
            window_start: now,
            ..Self::default()
        }
    }

    /// Account one control tick.
    pub fn record_tick(&mut self, relay_on: bool, dt_secs: u64) {
        if relay_on {
            self.on_secs += dt_secs;
        } else {
            self.off_secs += dt_secs;
        }
        self.loop_count = self.loop_count.saturating_add(1);
    }

    /// A compressor cycle completed (relay switched off after a run).
    pub fn record_cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
    }

    pub fn retract_cycle(&mut self) {
        self.cycles = self.cycles.saturating_sub(1);
    }

    /// Close the window if it is due.  Returns the new shift when it changed.
    pub fn evaluate(&mut self, now: u64, turbo: bool, cfg: &ControllerConfig) -> Option<f32> {
        if !cfg.adaptive_enabled {
            return None;
        }
        if turbo {
            self.discard_window(now);
            self.clear_pending();
            return None;
        }

        let window = now.saturating_sub(self.window_start);
        if window < u64::from(cfg.adaptive_interval_secs) {
            return None;
        }

        let (on, off, cycles) = (self.on_secs, self.off_secs, self.cycles);
        self.discard_window(now);

        // A skipped window breaks the confirmation streak.
        if self.loop_count < cfg.adaptive_min_loops {
            debug!("Tuner: {} loops, waiting for {}", self.loop_count, cfg.adaptive_min_loops);
            self.clear_pending();
            return None;
        }
        if self
            .last_adjust_at
            .is_some_and(|at| now.saturating_sub(at) < u64::from(cfg.adaptive_stabilize_secs))
        {
            debug!("Tuner: stabilising after last adjustment");
            self.clear_pending();
            return None;
        }

        let Some(class) = classify(on, off, cycles, window) else {
            debug!("Tuner: no completed cycle in the window");
            self.clear_pending();
            return None;
        };
        debug!("Tuner window: on={}s off={}s cycles={} → {:?}", on, off, cycles, class);

        let step = match class {
            CycleClass::Danger => {
                self.clear_pending();
                Some(DANGER_STEP_C)
            }
            CycleClass::Stable => {
                self.clear_pending();
                None
            }
            CycleClass::Widen => self.confirm(class).then_some(WIDEN_STEP_C),
            CycleClass::Tighten => self.confirm(class).then_some(-TIGHTEN_STEP_C),
        }?;

        self.apply(step, now, cfg)
    }

    /// Current band shift (°C).
    pub fn shift_c(&self) -> f32 {
        self.shift_c
    }

    /// Restore a persisted shift, clamped to the configured limits.
    pub fn restore_shift(&mut self, shift_c: f32, cfg: &ControllerConfig) {
        if shift_c.is_finite() {
            self.shift_c = shift_c.clamp(cfg.adaptive_min_shift_c, cfg.adaptive_max_shift_c);
        }
    }

    /// Effective hysteresis (base + shift).
    pub fn effective_hysteresis(&self, cfg: &ControllerConfig) -> f32 {
        cfg.hysteresis_c + self.shift_c
    }

    pub fn pending(&self) -> (Option<CycleClass>, u8) {
        (self.pending_direction, self.pending_count)
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Count a same-direction signal.  Returns `true` once confirmed.
    fn confirm(&mut self, class: CycleClass) -> bool {
        if self.pending_direction == Some(class) {
            self.pending_count = self.pending_count.saturating_add(1);
        } else {
            self.pending_direction = Some(class);
            self.pending_count = 1;
        }
        if self.pending_count >= CONFIRMATIONS {
            self.clear_pending();
            true
        } else {
            false
        }
    }

    fn apply(&mut self, step: f32, now: u64, cfg: &ControllerConfig) -> Option<f32> {
        let new_shift = (self.shift_c + step).clamp(cfg.adaptive_min_shift_c, cfg.adaptive_max_shift_c);

        if step > 0.0 {
            let low_threshold = cfg.target_temp_c - (cfg.hysteresis_c + new_shift);
            if low_threshold < cfg.freeze_cutoff_c + cfg.adaptive_freeze_margin_c {
                warn!(
                    "Tuner: widening refused, lower threshold {:.2}°C too close to freeze cut-off",
                    low_threshold
                );
                return None;
            }
        }

        if (new_shift - self.shift_c).abs() < f32::EPSILON {
            return None;
        }
        info!("Hysteresis shift {:+.2} → {:+.2}°C", self.shift_c, new_shift);
        self.shift_c = new_shift;
        self.last_adjust_at = Some(now);
        Some(new_shift)
    }

    fn discard_window(&mut self, now: u64) {
        self.on_secs = 0;
        self.off_secs = 0;
        self.cycles = 0;
        self.window_start = now;
    }

    fn clear_pending(&mut self) {
        self.pending_direction = None;
        self.pending_count = 0;
    }
}
