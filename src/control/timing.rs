//! Compressor timing guard: minimum run, minimum rest, maximum run.
//!
//! The guard itself is a pure function of the current and desired relay
//! state and the time since the last switch in each direction.
//! [`CompressorTiming`] holds the timestamps and the intended / confirmed
//! relay state; it is mutated only after a relay command is accepted, or
//! when the relay reports back.
//!
//! Timestamps are signed monotonic seconds so that the boot reconciler can
//! place a switch that happened before this boot in the past.

use log::{info, warn};

use crate::codes::ReasonCode;
use crate::config::ControllerConfig;

/// Outcome of a timing-guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardVerdict {
    pub allow: bool,
    pub reason: ReasonCode,
    /// Seconds until the blocking interval elapses (0 when allowed).
    pub remaining_secs: u64,
}

impl GuardVerdict {
    const ALLOW: Self = Self {
        allow: true,
        reason: ReasonCode::None,
        remaining_secs: 0,
    };
}

/// Pure timing rule.  `since_on` / `since_off` are `None` when the relay
/// has never switched in that direction; a missing timestamp never blocks.
pub fn check_transition(
    current: bool,
    desired: bool,
    since_on: Option<u64>,
    since_off: Option<u64>,
    cfg: &ControllerConfig,
) -> GuardVerdict {
    if current == desired {
        return GuardVerdict::ALLOW;
    }

    if desired {
        let min_off = u64::from(cfg.min_off_secs);
        if let Some(off) = since_off.filter(|s| *s < min_off) {
            return GuardVerdict {
                allow: false,
                reason: ReasonCode::ProtMinOff,
                remaining_secs: min_off - off,
            };
        }
    } else {
        let min_on = u64::from(cfg.min_on_secs);
        if let Some(on) = since_on.filter(|s| *s < min_on) {
            return GuardVerdict {
                allow: false,
                reason: ReasonCode::ProtMinOn,
                remaining_secs: min_on - on,
            };
        }
    }

    GuardVerdict::ALLOW
}

/// Relay timing state.
#[derive(Debug, Clone, Default)]
pub struct CompressorTiming {
    last_on_at: Option<i64>,
    last_off_at: Option<i64>,
    intended: bool,
    confirmed: bool,
    /// First command of the outstanding edge; kept across retries.
    unconfirmed_since: Option<u64>,
    /// Level of the last command the relay reported as failed.
    failed: Option<bool>,
}

impl CompressorTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted relay command.
    pub fn commit(&mut self, on: bool, now: u64) {
        if on {
            self.last_on_at = Some(now as i64);
        } else {
            self.last_off_at = Some(now as i64);
        }
        self.intended = on;
        if on == self.confirmed {
            self.unconfirmed_since = None;
            self.failed = None;
        } else if self.failed != Some(on) || self.unconfirmed_since.is_none() {
            self.unconfirmed_since = Some(now);
        }
    }

    /// The relay confirmed it reached `on`.
    pub fn confirm(&mut self, on: bool) {
        if on != self.intended {
            warn!(
                "Relay confirmed {} while {} is intended",
                on_off(on),
                on_off(self.intended)
            );
        }
        self.confirmed = on;
        if on == self.intended {
            self.unconfirmed_since = None;
            self.failed = None;
        }
    }

    /// The last command failed: fall back to the last confirmed state so the
    /// next tick re-evaluates.  A retry of the same level keeps the original
    /// command time for stuck detection.
    pub fn revert_to_confirmed(&mut self) {
        if self.intended != self.confirmed {
            info!("Relay command reverted, relay remains {}", on_off(self.confirmed));
            self.failed = Some(self.intended);
            self.intended = self.confirmed;
        }
    }

    /// An OFF command failed with the contact still closed.  The relay
    /// is believed welded: the intent stays OFF, the contact is ON.
    pub fn mark_welded(&mut self) {
        self.confirmed = true;
        self.failed = Some(false);
    }

    /// Boot-time synchronisation.  Ages are seconds before `now`.
    pub fn restore(
        &mut self,
        on: bool,
        on_age: Option<u64>,
        off_age: Option<u64>,
        now: u64,
    ) {
        let at = |age: u64| now as i64 - age.min(i64::MAX as u64) as i64;
        self.last_on_at = on_age.map(at);
        self.last_off_at = off_age.map(at);
        self.intended = on;
        self.confirmed = on;
        self.unconfirmed_since = None;
        self.failed = None;
    }

    pub fn intended(&self) -> bool {
        self.intended
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn since_on(&self, now: u64) -> Option<u64> {
        self.last_on_at.map(|t| (now as i64 - t).max(0) as u64)
    }

    pub fn since_off(&self, now: u64) -> Option<u64> {
        self.last_off_at.map(|t| (now as i64 - t).max(0) as u64)
    }

    /// Apply the guard against the intended state.
    pub fn guard(&self, desired: bool, now: u64, cfg: &ControllerConfig) -> GuardVerdict {
        check_transition(
            self.intended,
            desired,
            self.since_on(now),
            self.since_off(now),
            cfg,
        )
    }

    /// Relay intended on for at least `max_on_secs`.
    pub fn max_run_exceeded(&self, now: u64, cfg: &ControllerConfig) -> bool {
        self.intended
            && self
                .since_on(now)
                .is_some_and(|s| s >= u64::from(cfg.max_on_secs))
    }

    /// Current run length in seconds (0 when off).
    pub fn run_secs(&self, now: u64) -> u64 {
        if self.intended {
            self.since_on(now).unwrap_or(0)
        } else {
            0
        }
    }

    /// A commanded edge has gone unconfirmed, retries included, for longer
    /// than the relay response timeout.
    pub fn relay_stuck(&self, now: u64, cfg: &ControllerConfig) -> bool {
        (self.intended != self.confirmed || self.failed.is_some())
            && self.unconfirmed_since.is_some_and(|since| {
                now.saturating_sub(since) >= u64::from(cfg.relay_response_timeout_secs)
            })
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ControllerConfig {
        ControllerConfig::default()
    }

    #[test]
    fn no_op_is_always_allowed() {
        let c = cfg();
        assert!(check_transition(true, true, Some(0), Some(0), &c).allow);
        assert!(check_transition(false, false, Some(0), Some(0), &c).allow);
    }

    #[test]
    fn min_off_blocks_start() {
        let c = cfg();
        let v = check_transition(false, true, None, Some(100), &c);
        assert!(!v.allow);
        assert_eq!(v.reason, ReasonCode::ProtMinOff);
        assert_eq!(v.remaining_secs, 80);
    }

    #[test]
    fn min_on_blocks_stop() {
        let c = cfg();
        let v = check_transition(true, false, Some(10), None, &c);
        assert!(!v.allow);
        assert_eq!(v.reason, ReasonCode::ProtMinOn);
        assert_eq!(v.remaining_secs, 50);
    }

    #[test]
    fn never_switched_never_blocks() {
        let c = cfg();
        assert!(check_transition(false, true, None, None, &c).allow);
        assert!(check_transition(true, false, None, None, &c).allow);
    }

    #[test]
    fn commit_and_confirm_track_state() {
        let c = cfg();
        let mut t = CompressorTiming::new();
        t.commit(true, 100);
        assert!(t.intended());
        assert!(!t.confirmed());
        assert!(!t.relay_stuck(105, &c));
        assert!(t.relay_stuck(110, &c));
        t.confirm(true);
        assert!(!t.relay_stuck(200, &c));
        assert_eq!(t.run_secs(160), 60);
    }

    #[test]
    fn failed_command_reverts_intent() {
        let mut t = CompressorTiming::new();
        t.commit(true, 50);
        t.revert_to_confirmed();
        assert!(!t.intended());
    }

    #[test]
    fn retries_of_a_failing_edge_keep_the_stuck_timer() {
        let c = cfg();
        let mut t = CompressorTiming::new();
        t.commit(true, 100);
        t.revert_to_confirmed();
        t.commit(true, 105);
        assert!(!t.relay_stuck(105, &c));
        t.revert_to_confirmed();
        assert!(t.relay_stuck(110, &c), "timer restarted on retry");

        t.commit(true, 110);
        t.confirm(true);
        assert!(!t.relay_stuck(200, &c));
        t.commit(false, 300);
        assert!(!t.relay_stuck(305, &c));
    }

    #[test]
    fn welded_contact_stays_stuck() {
        let c = cfg();
        let mut t = CompressorTiming::new();
        t.restore(true, Some(600), None, 0);
        t.commit(false, 10);
        t.mark_welded();
        assert!(!t.intended());
        assert!(t.confirmed());
        assert!(!t.relay_stuck(15, &c));
        assert!(t.relay_stuck(20, &c));
        assert!(t.relay_stuck(5_000, &c));
    }

    #[test]
    fn max_run_detection() {
        let c = cfg();
        let mut t = CompressorTiming::new();
        t.commit(true, 0);
        assert!(!t.max_run_exceeded(7_199, &c));
        assert!(t.max_run_exceeded(7_200, &c));
        t.commit(false, 7_200);
        assert!(!t.max_run_exceeded(9_000, &c));
    }

    #[test]
    fn restore_places_switches_before_boot() {
        let c = cfg();
        let mut t = CompressorTiming::new();
        t.restore(false, None, Some(100), 5);
        assert_eq!(t.since_off(5), Some(100));
        let v = t.guard(true, 5, &c);
        assert_eq!(v.reason, ReasonCode::ProtMinOff);
        assert_eq!(v.remaining_secs, 80);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A transition is blocked exactly while its minimum interval has
        /// not elapsed.
        #[test]
        fn guard_respects_minimum_intervals(
            since in 0u64..1_000,
            min_on in 1u32..600,
            min_off in 1u32..600,
            start in any::<bool>(),
        ) {
            let c = ControllerConfig { min_on_secs: min_on, min_off_secs: min_off, ..Default::default() };
            let v = if start {
                check_transition(false, true, None, Some(since), &c)
            } else {
                check_transition(true, false, Some(since), None, &c)
            };
            let limit = u64::from(if start { min_off } else { min_on });
            prop_assert_eq!(v.allow, since >= limit);
            if !v.allow {
                prop_assert_eq!(v.remaining_secs, limit - since);
            }
        }
    }
}
