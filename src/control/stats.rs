//! Runtime statistics: duty cycle (hour / day / lifetime), cycle count and
//! average on / off period lengths.

use heapless::Deque;
use serde::{Deserialize, Serialize};

const HOUR_SECS: u64 = 3_600;
/// Completed periods kept for the on / off averages.
const PERIOD_HISTORY: usize = 8;

/// Lifetime counters that survive restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub life_on_secs: u64,
    pub life_total_secs: u64,
    pub cycles: u32,
}

/// On / total seconds over some span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DutyBucket {
    on: u32,
    total: u32,
}

impl DutyBucket {
    fn add(&mut self, on: bool, secs: u32) {
        self.total = self.total.saturating_add(secs);
        if on {
            self.on = self.on.saturating_add(secs);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeStats {
    hour: DutyBucket,
    hour_started_at: u64,
    /// Completed hours, oldest first.
    hours: Deque<DutyBucket, 23>,
    life: StatsSnapshot,
    on_periods: Deque<u32, PERIOD_HISTORY>,
    off_periods: Deque<u32, PERIOD_HISTORY>,
}

impl RuntimeStats {
    pub fn new(now: u64) -> Self {
        Self {
            hour: DutyBucket::default(),
            hour_started_at: now,
            hours: Deque::new(),
            life: StatsSnapshot::default(),
            on_periods: Deque::new(),
            off_periods: Deque::new(),
        }
    }

    /// Account one tick.  Returns `true` when an hour boundary was crossed.
    pub fn record_tick(&mut self, relay_on: bool, dt_secs: u64, now: u64) -> bool {
        self.add_elapsed(relay_on, dt_secs);

        if now.saturating_sub(self.hour_started_at) < HOUR_SECS {
            return false;
        }
        if self.hours.is_full() {
            self.hours.pop_front();
        }
        // Cannot fail: one slot was just freed if needed
        let _ = self.hours.push_back(self.hour);
        self.hour = DutyBucket::default();
        self.hour_started_at = now;
        true
    }

    /// Add time spent in one state (also used for the offline gap at boot).
    pub fn add_elapsed(&mut self, relay_on: bool, secs: u64) {
        let secs32 = u32::try_from(secs).unwrap_or(u32::MAX);
        self.hour.add(relay_on, secs32);
        self.life.life_total_secs = self.life.life_total_secs.saturating_add(secs);
        if relay_on {
            self.life.life_on_secs = self.life.life_on_secs.saturating_add(secs);
        }
    }

    /// A run of `secs` just ended.
    pub fn record_on_period(&mut self, secs: u64) {
        self.count_cycle();
        push_period(&mut self.on_periods, secs);
    }

    /// A rest of `secs` just ended.
    pub fn record_off_period(&mut self, secs: u64) {
        push_period(&mut self.off_periods, secs);
    }

    /// Undo the last [`record_on_period`](Self::record_on_period): the
    /// relay never confirmed the OFF that closed the run.
    pub fn retract_on_period(&mut self) {
        self.life.cycles = self.life.cycles.saturating_sub(1);
        self.on_periods.pop_back();
    }

    pub fn retract_off_period(&mut self) {
        self.off_periods.pop_back();
    }

    pub fn count_cycle(&mut self) {
        self.life.cycles = self.life.cycles.saturating_add(1);
    }

    pub fn cycles(&self) -> u32 {
        self.life.cycles
    }

    pub fn life_on_secs(&self) -> u64 {
        self.life.life_on_secs
    }

    pub fn life_total_secs(&self) -> u64 {
        self.life.life_total_secs
    }

    /// Duty % over the current hour.
    pub fn duty_hour(&self) -> f32 {
        percent(u64::from(self.hour.on), u64::from(self.hour.total))
    }

    /// Duty % over the current hour plus up to 23 completed ones.
    pub fn duty_day(&self) -> f32 {
        let (on, total) = self
            .hours
            .iter()
            .chain(core::iter::once(&self.hour))
            .fold((0u64, 0u64), |(on, total), b| {
                (on + u64::from(b.on), total + u64::from(b.total))
            });
        percent(on, total)
    }

    pub fn duty_life(&self) -> f32 {
        percent(self.life.life_on_secs, self.life.life_total_secs)
    }

    /// Average of the last completed run lengths.
    pub fn avg_on_secs(&self) -> Option<u32> {
        average(&self.on_periods)
    }

    pub fn avg_off_secs(&self) -> Option<u32> {
        average(&self.off_periods)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.life
    }

    pub fn restore(&mut self, snapshot: StatsSnapshot) {
        self.life = snapshot;
    }
}

fn push_period(buf: &mut Deque<u32, PERIOD_HISTORY>, secs: u64) {
    if buf.is_full() {
        buf.pop_front();
    }
    let _ = buf.push_back(u32::try_from(secs).unwrap_or(u32::MAX));
}

fn average(buf: &Deque<u32, PERIOD_HISTORY>) -> Option<u32> {
    if buf.is_empty() {
        return None;
    }
    let sum: u64 = buf.iter().map(|s| u64::from(*s)).sum();
    Some((sum / buf.len() as u64) as u32)
}

fn percent(on: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        on as f32 * 100.0 / total as f32
    }
}
