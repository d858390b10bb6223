//! Defrost controller.
//!
//! One generic machine, [`DefrostCycle`], parameterised by a
//! [`DefrostPolicy`] and instantiated twice:
//!
//! ```text
//!        trigger               end met             dwell elapsed
//!  IDLE ─────────▶ TRIGGERED ─────────▶ DWELLING ───────────────▶ IDLE
//!                      ▲                    │
//!                      └──── end lost ──────┘
//!
//!  any active phase ──[max duration]──▶ IDLE
//! ```
//!
//! - [`DynamicDefrost`]: evaporator thresholds.
//! - [`ScheduledDefrost`]: local-hour edge, fixed duration.  Also used for
//!   manually requested defrosts.
//!
//! [`DefrostController`] arbitrates the two: dynamic wins over scheduled,
//! and turbo aborts both.

use log::{info, warn};

use crate::codes::ReasonCode;
use crate::config::ControllerConfig;

/// Inputs sampled once per tick.
#[derive(Debug, Clone, Copy)]
pub struct DefrostInputs {
    pub now: u64,
    /// Evaporator decision value; `None` when the probe is unusable.
    pub evap: Option<f32>,
    /// Local wall-clock hour; `None` until the clock is synced.
    pub local_hour: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefrostPhase {
    Idle,
    Triggered,
    Dwelling,
}

/// What started the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefrostOrigin {
    Dynamic,
    Scheduled,
    Manual,
}

impl DefrostOrigin {
    pub const fn reason(self) -> ReasonCode {
        match self {
            Self::Dynamic => ReasonCode::DefrostDynamic,
            Self::Scheduled => ReasonCode::DefrostScheduled,
            Self::Manual => ReasonCode::DefrostTriggered,
        }
    }
}

/// Trigger and termination rules for one defrost flavour.
pub trait DefrostPolicy {
    const NAME: &'static str;
    const ORIGIN: DefrostOrigin;

    /// Called every tick, whatever the phase, so edge-based policies can
    /// track their input.
    fn should_trigger(&mut self, inp: &DefrostInputs, cfg: &ControllerConfig) -> bool;
    fn end_reached(&self, inp: &DefrostInputs, cfg: &ControllerConfig) -> bool;
    fn dwell_secs(&self, cfg: &ControllerConfig) -> u64;
    fn max_duration_secs(&self, cfg: &ControllerConfig) -> u64;
}

// ── Policies ──────────────────────────────────────────────────

/// Evaporator-threshold defrost.
#[derive(Debug, Clone, Default)]
pub struct DynamicDefrost;

impl DefrostPolicy for DynamicDefrost {
    const NAME: &'static str = "dynamic";
    const ORIGIN: DefrostOrigin = DefrostOrigin::Dynamic;

    fn should_trigger(&mut self, inp: &DefrostInputs, cfg: &ControllerConfig) -> bool {
        inp.evap.is_some_and(|e| e <= cfg.defrost_trigger_c)
    }

    fn end_reached(&self, inp: &DefrostInputs, cfg: &ControllerConfig) -> bool {
        inp.evap.is_some_and(|e| e >= cfg.defrost_end_c)
    }

    fn dwell_secs(&self, cfg: &ControllerConfig) -> u64 {
        u64::from(cfg.defrost_dwell_secs)
    }

    fn max_duration_secs(&self, cfg: &ControllerConfig) -> u64 {
        u64::from(cfg.defrost_max_secs)
    }
}

/// Clock-scheduled defrost.  Triggers on entering the configured hour;
/// the first hour seen after boot is never treated as an edge.
#[derive(Debug, Clone, Default)]
pub struct ScheduledDefrost {
    last_hour: Option<u8>,
}

impl DefrostPolicy for ScheduledDefrost {
    const NAME: &'static str = "scheduled";
    const ORIGIN: DefrostOrigin = DefrostOrigin::Scheduled;

    fn should_trigger(&mut self, inp: &DefrostInputs, cfg: &ControllerConfig) -> bool {
        let previous = self.last_hour;
        self.last_hour = inp.local_hour;
        match (cfg.defrost_schedule_hour, previous, inp.local_hour) {
            (Some(at), Some(prev), Some(hour)) => hour == at && prev != at,
            _ => false,
        }
    }

    fn end_reached(&self, _inp: &DefrostInputs, _cfg: &ControllerConfig) -> bool {
        true
    }

    fn dwell_secs(&self, cfg: &ControllerConfig) -> u64 {
        u64::from(cfg.sched_defrost_secs)
    }

    fn max_duration_secs(&self, cfg: &ControllerConfig) -> u64 {
        u64::from(cfg.sched_defrost_secs.max(cfg.defrost_max_secs))
    }
}

// ── Generic cycle ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DefrostCycle<P: DefrostPolicy> {
    policy: P,
    phase: DefrostPhase,
    phase_since: u64,
    started_at: u64,
    origin: Option<DefrostOrigin>,
}

impl<P: DefrostPolicy + Default> Default for DefrostCycle<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: DefrostPolicy> DefrostCycle<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            phase: DefrostPhase::Idle,
            phase_since: 0,
            started_at: 0,
            origin: None,
        }
    }

    /// Advance one tick.  `allow_trigger` gates new cycles only; an active
    /// cycle always runs to completion unless aborted.
    pub fn update(&mut self, inp: &DefrostInputs, allow_trigger: bool, cfg: &ControllerConfig) {
        let triggered = self.policy.should_trigger(inp, cfg);

        if self.phase == DefrostPhase::Idle {
            if triggered && allow_trigger {
                self.start(P::ORIGIN, inp.now);
            }
            return;
        }

        let elapsed = inp.now.saturating_sub(self.started_at);
        if elapsed >= self.policy.max_duration_secs(cfg) {
            warn!("Defrost ({}) hit max duration after {}s", P::NAME, elapsed);
            self.finish();
            return;
        }

        let end = self.policy.end_reached(inp, cfg);
        match self.phase {
            DefrostPhase::Triggered if end => self.enter(DefrostPhase::Dwelling, inp.now),
            DefrostPhase::Dwelling if !end => self.enter(DefrostPhase::Triggered, inp.now),
            DefrostPhase::Dwelling
                if inp.now.saturating_sub(self.phase_since) >= self.policy.dwell_secs(cfg) =>
            {
                info!("Defrost ({}) complete after {}s", P::NAME, elapsed);
                self.finish();
            }
            _ => {}
        }
    }

    /// Start a cycle now regardless of the trigger condition.
    pub fn start(&mut self, origin: DefrostOrigin, now: u64) {
        info!("Defrost ({}) started: {:?}", P::NAME, origin);
        self.phase = DefrostPhase::Triggered;
        self.phase_since = now;
        self.started_at = now;
        self.origin = Some(origin);
    }

    /// Cancel an active cycle.
    pub fn abort(&mut self, why: &str) {
        if self.is_active() {
            info!("Defrost ({}) aborted: {}", P::NAME, why);
            self.finish();
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != DefrostPhase::Idle
    }

    pub fn phase(&self) -> DefrostPhase {
        self.phase
    }

    pub fn origin(&self) -> Option<DefrostOrigin> {
        self.origin
    }

    fn enter(&mut self, phase: DefrostPhase, now: u64) {
        self.phase = phase;
        self.phase_since = now;
    }

    fn finish(&mut self) {
        self.phase = DefrostPhase::Idle;
        self.origin = None;
    }
}

// ── Arbitration ───────────────────────────────────────────────

/// Both defrost machines and the rules between them.
#[derive(Debug, Clone, Default)]
pub struct DefrostController {
    pub dynamic: DefrostCycle<DynamicDefrost>,
    pub scheduled: DefrostCycle<ScheduledDefrost>,
}

impl DefrostController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, inp: &DefrostInputs, turbo: bool, cfg: &ControllerConfig) {
        if turbo {
            self.dynamic.abort("turbo active");
            self.scheduled.abort("turbo active");
        }

        self.dynamic.update(inp, !turbo, cfg);
        if self.dynamic.is_active() {
            self.scheduled.abort("dynamic defrost active");
        }
        let allow_scheduled = !turbo && !self.dynamic.is_active();
        self.scheduled.update(inp, allow_scheduled, cfg);
    }

    /// Start a fixed-duration defrost on request.  Refused while another
    /// cycle runs or turbo is on.
    pub fn start_manual(&mut self, now: u64, turbo: bool) -> bool {
        if turbo || self.dynamic.is_active() || self.scheduled.is_active() {
            return false;
        }
        self.scheduled.start(DefrostOrigin::Manual, now);
        true
    }

    /// Abort everything (turbo switched on).
    pub fn abort_all(&mut self, why: &str) {
        self.dynamic.abort(why);
        self.scheduled.abort(why);
    }

    /// Reason code of the active scheduled or manual cycle.
    pub fn scheduled_reason(&self) -> Option<ReasonCode> {
        self.scheduled.origin().map(DefrostOrigin::reason)
    }

    pub fn dynamic_active(&self) -> bool {
        self.dynamic.is_active()
    }

    pub fn any_active(&self) -> bool {
        self.dynamic.is_active() || self.scheduled.is_active()
    }
}
