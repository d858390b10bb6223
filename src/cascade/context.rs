//! Read-only snapshot handed to every cascade guard.

use crate::codes::ReasonCode;
use crate::config::ControllerConfig;

/// Everything a guard may look at.  Built fresh each tick by the service
/// from [`ControllerState`](crate::state::ControllerState); guards never
/// mutate anything.
#[derive(Debug, Clone, Copy)]
pub struct CascadeContext<'a> {
    pub cfg: &'a ControllerConfig,
    pub uptime_secs: u64,
    /// Intended relay state.
    pub relay_on: bool,
    /// Air decision value.
    pub air: Option<f32>,
    /// Fatal or escalated alarm active.
    pub fatal_alarm: bool,
    pub limp: bool,
    pub turbo: bool,
    pub door_open: bool,
    /// Reason of the active scheduled / manual defrost.
    pub scheduled_defrost: Option<ReasonCode>,
    pub freeze_locked: bool,
    pub max_run_exceeded: bool,
    pub dynamic_defrost: bool,
    /// Adaptive band shift (°C).
    pub hysteresis_shift_c: f32,
}

impl<'a> CascadeContext<'a> {
    /// Quiescent context: nothing active, relay off, no reading.
    pub fn idle(cfg: &'a ControllerConfig) -> Self {
        Self {
            cfg,
            uptime_secs: 0,
            relay_on: false,
            air: None,
            fatal_alarm: false,
            limp: false,
            turbo: false,
            door_open: false,
            scheduled_defrost: None,
            freeze_locked: false,
            max_run_exceeded: false,
            dynamic_defrost: false,
            hysteresis_shift_c: 0.0,
        }
    }
}
