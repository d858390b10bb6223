//! Boot reconciler.
//!
//! Runs once before the first tick.  Restores the persisted parts into
//! the controller state, then compares the relay state we believed in at
//! the last save with the live relay level:
//!
//! | believed | live | action                                          |
//! |----------|------|-------------------------------------------------|
//! | ON       | ON   | keep running, offline gap counted as run time   |
//! | ON       | OFF  | sync to OFF (fresh off time), count the cycle   |
//! | OFF      | ON   | sync to ON with a fresh on time                 |
//! | OFF      | OFF  | stay idle, offline gap counted as idle time     |
//!
//! The offline gap is `wall_now - saved_at`, clamped to one hour, and zero
//! without a synced wall clock.

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::persist::{PersistedState, RelayRecord};
use crate::state::ControllerState;

/// Longest offline gap credited to the statistics.
pub const MAX_OFFLINE_CREDIT_SECS: u64 = 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootCase {
    KeepRunning,
    SyncedOff,
    SyncedOn,
    KeepIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    pub case: BootCase,
    /// Offline gap credited to the statistics.
    pub elapsed_secs: u64,
    /// A cycle that ended while we were down was counted.
    pub cycle_counted: bool,
}

/// Restore persisted parts and reconcile the relay.  `now` is monotonic,
/// `wall_now` is unix seconds when the clock is synced.
pub fn reconcile(
    state: &mut ControllerState,
    persisted: &PersistedState,
    live_on: bool,
    now: u64,
    wall_now: Option<u64>,
    cfg: &ControllerConfig,
) -> BootReport {
    restore_parts(state, persisted, cfg);

    let record = persisted.relay.unwrap_or_default();
    let elapsed = offline_gap(&record, wall_now);
    let on_age = age(&record, record.on_at, elapsed);
    let off_age = age(&record, record.off_at, elapsed);

    let mut cycle_counted = false;
    let case = match (record.believed_on, live_on) {
        (true, true) => {
            state.timing.restore(true, on_age, off_age, now);
            state.stats.add_elapsed(true, elapsed);
            BootCase::KeepRunning
        }
        (true, false) => {
            warn!("Boot: relay believed ON but is OFF, resyncing");
            state.timing.restore(false, on_age, Some(0), now);
            if plausible_run(&record) {
                state.stats.count_cycle();
                cycle_counted = true;
            }
            state.stats.add_elapsed(false, elapsed);
            BootCase::SyncedOff
        }
        (false, true) => {
            warn!("Boot: relay believed OFF but is ON, resyncing");
            state.timing.restore(true, Some(0), off_age, now);
            BootCase::SyncedOn
        }
        (false, false) => {
            state.timing.restore(false, on_age, off_age, now);
            state.stats.add_elapsed(false, elapsed);
            BootCase::KeepIdle
        }
    };

    state.protection.weld.reset();
    state.booted = true;
    info!(
        "Boot reconciled: {:?} (offline credit {}s, relay {})",
        case,
        elapsed,
        if live_on { "ON" } else { "OFF" }
    );

    BootReport {
        case,
        elapsed_secs: elapsed,
        cycle_counted,
    }
}

fn restore_parts(state: &mut ControllerState, persisted: &PersistedState, cfg: &ControllerConfig) {
    if let Some(stats) = persisted.stats {
        state.stats.restore(stats);
    }
    if let Some(tuning) = persisted.tuning {
        state.tuner.restore_shift(tuning.shift_c, cfg);
        state.protection.power.restore_ghost_count(tuning.ghost_count);
    }
    if let Some(alarms) = persisted.alarms {
        state.alarms.restore_latch(alarms.fatal, alarms.escalated);
        state.protection.freeze.restore_lock_count(alarms.freeze_lock_count);
    }
}

fn offline_gap(record: &RelayRecord, wall_now: Option<u64>) -> u64 {
    match (wall_now, record.saved_at) {
        (Some(now), Some(saved)) => now.saturating_sub(saved).min(MAX_OFFLINE_CREDIT_SECS),
        _ => 0,
    }
}

/// Seconds between a persisted switch time and now.
fn age(record: &RelayRecord, at: Option<u64>, elapsed: u64) -> Option<u64> {
    let at = at?;
    let saved = record.saved_at?;
    Some(saved.saturating_sub(at).saturating_add(elapsed))
}

fn plausible_run(record: &RelayRecord) -> bool {
    match (record.on_at, record.saved_at) {
        (Some(on), Some(saved)) => on != 0 && on <= saved,
        _ => false,
    }
}
