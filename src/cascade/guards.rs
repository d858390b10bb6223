//! Guard table.  Order is priority: the first guard returning a verdict
//! decides the tick.

use crate::codes::ReasonCode;
use crate::control::limp::limp_wants_on;

use super::context::CascadeContext;
use super::{GuardDescriptor, Mode, Verdict};

// ═══════════════════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════════════════

pub static GUARDS: [GuardDescriptor; 9] = [
    GuardDescriptor {
        name: "fatal_alarm",
        evaluate: fatal_alarm,
    },
    GuardDescriptor {
        name: "limp",
        evaluate: limp,
    },
    GuardDescriptor {
        name: "turbo",
        evaluate: turbo,
    },
    GuardDescriptor {
        name: "door_open",
        evaluate: door_open,
    },
    GuardDescriptor {
        name: "scheduled_defrost",
        evaluate: scheduled_defrost,
    },
    GuardDescriptor {
        name: "freeze_lock",
        evaluate: freeze_lock,
    },
    GuardDescriptor {
        name: "max_run",
        evaluate: max_run,
    },
    GuardDescriptor {
        name: "dynamic_defrost",
        evaluate: dynamic_defrost,
    },
    GuardDescriptor {
        name: "thermostat",
        evaluate: thermostat,
    },
];

// ═══════════════════════════════════════════════════════════════════════════
//  Guards
// ═══════════════════════════════════════════════════════════════════════════

fn fatal_alarm(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.fatal_alarm.then(|| Verdict::force_off(ReasonCode::None))
}

fn limp(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.limp.then(|| Verdict {
        want_on: limp_wants_on(ctx.uptime_secs, ctx.cfg),
        forced: false,
        mode: Mode::Limp,
        reason: ReasonCode::None,
    })
}

fn turbo(ctx: &CascadeContext) -> Option<Verdict> {
    if !ctx.turbo {
        return None;
    }
    let want_on = band_decision(
        ctx.air,
        ctx.relay_on,
        ctx.cfg.turbo_target_c,
        ctx.cfg.turbo_hysteresis_c,
    );
    Some(Verdict {
        want_on,
        forced: false,
        mode: Mode::Turbo,
        reason: ReasonCode::None,
    })
}

fn door_open(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.door_open
        .then(|| Verdict::force_off(ReasonCode::ProtDoorOpen))
}

fn scheduled_defrost(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.scheduled_defrost.map(Verdict::force_off)
}

fn freeze_lock(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.freeze_locked
        .then(|| Verdict::force_off(ReasonCode::ProtAirFreeze))
}

fn max_run(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.max_run_exceeded
        .then(|| Verdict::force_off(ReasonCode::ProtMaxOn))
}

fn dynamic_defrost(ctx: &CascadeContext) -> Option<Verdict> {
    ctx.dynamic_defrost
        .then(|| Verdict::force_off(ReasonCode::DefrostDynamic))
}

/// Always decides.
fn thermostat(ctx: &CascadeContext) -> Option<Verdict> {
    let want_on = band_decision(
        ctx.air,
        ctx.relay_on,
        ctx.cfg.target_temp_c,
        ctx.cfg.hysteresis_c + ctx.hysteresis_shift_c,
    );
    Some(Verdict {
        want_on,
        forced: false,
        mode: Mode::Normal,
        reason: ReasonCode::None,
    })
}

/// Two-point control: above the band → on, below → off, inside → hold.
/// No reading → off.
pub fn band_decision(air: Option<f32>, relay_on: bool, target: f32, hysteresis: f32) -> bool {
    match air {
        Some(t) if t > target + hysteresis => true,
        Some(t) if t < target - hysteresis => false,
        Some(_) => relay_on,
        None => false,
    }
}
