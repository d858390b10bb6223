//! Mode decision engine.
//!
//! A fixed table of guard evaluators, walked in priority order:
//!
//! ```text
//! ┌───┬───────────────────┬──────────────────────────────────────┐
//! │ # │ guard             │ verdict                              │
//! ├───┼───────────────────┼──────────────────────────────────────┤
//! │ 1 │ fatal_alarm       │ forced OFF                           │
//! │ 2 │ limp              │ duty cycle, bypasses timing guard    │
//! │ 3 │ turbo             │ thermostat on turbo band             │
//! │ 4 │ door_open         │ forced OFF  PROT_DOOR_OPEN           │
//! │ 5 │ scheduled_defrost │ forced OFF  DEFR_SCHED / DEFR_TRIG   │
//! │ 6 │ freeze_lock       │ forced OFF  PROT_AIR_FRZ             │
//! │ 7 │ max_run           │ forced OFF  PROT_MAX_ON              │
//! │ 8 │ dynamic_defrost   │ forced OFF  DEFR_DYN                 │
//! │ 9 │ thermostat        │ band with adaptive shift             │
//! └───┴───────────────────┴──────────────────────────────────────┘
//! ```
//!
//! The first guard returning `Some` wins.  The verdict is then checked
//! against the compressor timing guard; a forced OFF skips the MIN_ON
//! check and limp mode skips both minimums.  The engine holds no state.

pub mod context;
pub mod guards;

use serde::Serialize;

use crate::codes::{ReasonCode, StatusCode};
use crate::control::timing::CompressorTiming;

pub use context::CascadeContext;

/// Control regime selected by the winning guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Normal,
    Turbo,
    Limp,
}

/// Output of a single guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub want_on: bool,
    /// Forced OFF: not subject to the minimum run time.
    pub forced: bool,
    pub mode: Mode,
    pub reason: ReasonCode,
}

impl Verdict {
    pub const fn force_off(reason: ReasonCode) -> Self {
        Self {
            want_on: false,
            forced: true,
            mode: Mode::Normal,
            reason,
        }
    }
}

/// Guard evaluator signature.
pub type GuardFn = fn(&CascadeContext) -> Option<Verdict>;

/// One row of the guard table.
pub struct GuardDescriptor {
    pub name: &'static str,
    pub evaluate: GuardFn,
}

/// Resolved decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionResult {
    /// What the winning guard asked for.
    pub want_on: bool,
    /// Relay state to command after the timing guard.
    pub relay_on: bool,
    /// Status assuming the command executes.
    pub status: StatusCode,
    pub reason: ReasonCode,
    /// Name of the winning guard.
    pub detail: &'static str,
    pub mode: Mode,
}

impl DecisionResult {
    /// Whether this decision changes the relay.
    pub fn switches(&self, current: bool) -> bool {
        self.relay_on != current
    }

    /// Status to report when the relay stays at `current` (command not
    /// issued or refused).
    pub fn mirror(&self, current: bool) -> StatusCode {
        if self.relay_on == current {
            self.status
        } else {
            running_status(self.mode, current)
        }
    }
}

/// Run the guard table and the timing guard.
pub fn decide(ctx: &CascadeContext, timing: &CompressorTiming, now: u64) -> DecisionResult {
    let (detail, verdict) = guards::GUARDS
        .iter()
        .find_map(|g| (g.evaluate)(ctx).map(|v| (g.name, v)))
        .unwrap_or(("none", Verdict::force_off(ReasonCode::None)));

    resolve(ctx.relay_on, detail, verdict, timing, now, ctx)
}

fn resolve(
    current: bool,
    detail: &'static str,
    verdict: Verdict,
    timing: &CompressorTiming,
    now: u64,
    ctx: &CascadeContext,
) -> DecisionResult {
    let allowed = |relay_on: bool, reason: ReasonCode| DecisionResult {
        want_on: verdict.want_on,
        relay_on,
        status: running_status(verdict.mode, relay_on),
        reason,
        detail,
        mode: verdict.mode,
    };

    if verdict.want_on == current
        || verdict.mode == Mode::Limp
        || (verdict.forced && !verdict.want_on)
    {
        return allowed(verdict.want_on, verdict.reason);
    }

    let guard = timing.guard(verdict.want_on, now, ctx.cfg);
    if guard.allow {
        return allowed(verdict.want_on, verdict.reason);
    }

    DecisionResult {
        want_on: verdict.want_on,
        relay_on: current,
        status: if verdict.want_on {
            StatusCode::WantCool
        } else {
            StatusCode::WantIdle
        },
        reason: guard.reason,
        detail,
        mode: verdict.mode,
    }
}

fn running_status(mode: Mode, on: bool) -> StatusCode {
    match (mode, on) {
        (Mode::Normal, true) => StatusCode::Cooling,
        (Mode::Normal, false) => StatusCode::Idle,
        (Mode::Turbo, true) => StatusCode::TurboCool,
        (Mode::Turbo, false) => StatusCode::TurboIdle,
        (Mode::Limp, true) => StatusCode::LimpCool,
        (Mode::Limp, false) => StatusCode::LimpIdle,
    }
}
