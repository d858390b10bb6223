//! Controller state aggregate.
//!
//! Every piece of mutable control state lives here, owned by the
//! [`ControllerService`](crate::app::service::ControllerService).  Created
//! once at start (defaults, then overlaid by the boot reconciler from the
//! persisted snapshot) and mutated in place once per tick.

use log::info;

use crate::codes::{ReasonCode, StatusCode};
use crate::config::ControllerConfig;
use crate::control::adaptive::AdaptiveTuner;
use crate::control::defrost::DefrostController;
use crate::control::door::DoorDetector;
use crate::control::health::SensorHealth;
use crate::control::limp::LimpMode;
use crate::control::protection::ProtectionSet;
use crate::control::signal::SignalConditioner;
use crate::control::stats::RuntimeStats;
use crate::control::timing::CompressorTiming;
use crate::safety::AlarmSupervisor;

/// Conditioning and health for one probe.
#[derive(Debug, Clone)]
pub struct ProbeState {
    pub signal: SignalConditioner,
    pub health: SensorHealth,
    /// This tick's raw sample (`None` = missing).
    pub raw: Option<f32>,
}

impl ProbeState {
    pub fn new(name: &'static str, now: u64) -> Self {
        Self {
            signal: SignalConditioner::new(),
            health: SensorHealth::new(name, now),
            raw: None,
        }
    }

    /// Decision value, unless the probe is in critical failure.
    pub fn usable_value(&self) -> Option<f32> {
        if self.health.is_critical() {
            None
        } else {
            self.signal.decision_value()
        }
    }
}

/// Turbo (pull-down) mode.
#[derive(Debug, Clone, Default)]
pub struct TurboState {
    active: bool,
    since: u64,
}

impl TurboState {
    pub fn set(&mut self, on: bool, now: u64) -> bool {
        if on == self.active {
            return false;
        }
        info!("Turbo {}", if on { "enabled" } else { "disabled" });
        self.active = on;
        self.since = now;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn expired(&self, now: u64, cfg: &ControllerConfig) -> bool {
        self.active && now.saturating_sub(self.since) >= u64::from(cfg.turbo_max_secs)
    }
}

/// Relay error accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayErrors {
    pub consecutive: u32,
    pub total: u32,
    /// A commanded edge stayed unconfirmed past the response timeout.
    pub stuck: bool,
}

impl RelayErrors {
    /// Count one failure.  Returns `true` when the consecutive count hits
    /// the escalation limit.
    pub fn record(&mut self, limit: u32) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.total = self.total.saturating_add(1);
        self.consecutive == limit
    }

    pub fn clear_consecutive(&mut self) {
        self.consecutive = 0;
    }
}

/// Statistics booked for a relay edge the relay has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedEdge {
    pub on: bool,
    /// A period (and, for OFF, a cycle) was recorded for this edge.
    pub period: bool,
}

/// Last decision as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionSnapshot {
    pub status: StatusCode,
    pub reason: ReasonCode,
    pub detail: &'static str,
}

/// Everything the controller mutates.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub air: ProbeState,
    pub evap: ProbeState,
    pub power_w: Option<f32>,
    pub timing: CompressorTiming,
    pub protection: ProtectionSet,
    pub defrost: DefrostController,
    pub door: DoorDetector,
    pub tuner: AdaptiveTuner,
    pub limp: LimpMode,
    pub stats: RuntimeStats,
    pub alarms: AlarmSupervisor,
    pub turbo: TurboState,
    pub relay_errors: RelayErrors,
    /// Rolled back if the relay reports the edge as failed.
    pub unconfirmed_edge: Option<BookedEdge>,
    pub decision: DecisionSnapshot,
    /// Boot reconciliation has completed.
    pub booted: bool,
    pub started_at: u64,
    pub last_tick_at: Option<u64>,
    /// Previous level of the manual override input (edge detection).
    pub override_level: bool,
    pub consecutive_faults: u8,
}

impl ControllerState {
    pub fn new(now: u64) -> Self {
        Self {
            air: ProbeState::new("air", now),
            evap: ProbeState::new("evaporator", now),
            power_w: None,
            timing: CompressorTiming::new(),
            protection: ProtectionSet::new(),
            defrost: DefrostController::new(),
            door: DoorDetector::new(),
            tuner: AdaptiveTuner::new(now),
            limp: LimpMode::new(),
            stats: RuntimeStats::new(now),
            alarms: AlarmSupervisor::new(),
            turbo: TurboState::default(),
            relay_errors: RelayErrors::default(),
            unconfirmed_edge: None,
            decision: DecisionSnapshot {
                status: StatusCode::Boot,
                reason: ReasonCode::None,
                detail: "boot",
            },
            booted: false,
            started_at: now,
            last_tick_at: None,
            override_level: false,
            consecutive_faults: 0,
        }
    }

    pub fn uptime_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_boot_status() {
        let s = ControllerState::new(0);
        assert_eq!(s.decision.status, StatusCode::Boot);
        assert!(!s.booted);
        assert!(!s.timing.intended());
    }

    #[test]
    fn turbo_expires() {
        let cfg = ControllerConfig::default();
        let mut t = TurboState::default();
        assert!(t.set(true, 100));
        assert!(!t.set(true, 200));
        assert!(!t.expired(7_299, &cfg));
        assert!(t.expired(7_300, &cfg));
    }

    #[test]
    fn relay_errors_escalate_once() {
        let mut e = RelayErrors::default();
        let hits: Vec<bool> = (0..7).map(|_| e.record(5)).collect();
        assert_eq!(hits, [false, false, false, false, true, false, false]);
        assert_eq!(e.total, 7);
        e.clear_consecutive();
        assert_eq!(e.consecutive, 0);
    }
}
