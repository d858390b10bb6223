//! Protection set: hardware and food-safety detectors.
//!
//! | Detector     | Condition                                  | Alarm        |
//! |--------------|--------------------------------------------|--------------|
//! | `freeze`     | air ≤ cut-off (lock, hysteretic release)   | -            |
//! | `power`      | locked rotor / ghost run                   | LOCKED / COMP_GHOST |
//! | `weld`       | air keeps dropping after relay off         | WELD         |
//! | `cooling`    | air − evap below margin after long run     | COOLING_FAIL |
//! | `HighTemp`   | air above limit for the delay              | HIGH_TEMP    |
//!
//! Each detector owns and mutates only its own state.  Forced-off decisions
//! are never taken here: the cascade reads the report and the alarm mask.

pub mod cooling;
pub mod freeze;
pub mod power;
pub mod weld;

use log::warn;

use crate::config::ControllerConfig;
use crate::safety::{Alarm, AlarmSupervisor};

use cooling::CoolingMonitor;
use freeze::FreezeGuard;
use power::PowerMonitor;
use weld::WeldDetector;

/// Per-tick inputs shared by all detectors.
#[derive(Debug, Clone, Copy)]
pub struct ProtectionInputs {
    pub now: u64,
    /// Intended relay state.
    pub relay_on: bool,
    /// Seconds since the current run started (0 when off).
    pub run_secs: u64,
    /// Air decision value.
    pub air: Option<f32>,
    /// Evaporator decision value, `None` when the probe is unusable.
    pub evap: Option<f32>,
    pub power_w: Option<f32>,
}

/// Detector outputs for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectionReport {
    pub freeze_locked: bool,
    pub locked_rotor: bool,
    pub ghost: bool,
    pub ghost_fatal: bool,
    pub weld: bool,
    pub cooling_fail: bool,
    pub high_temp: bool,
}

impl ProtectionReport {
    /// Translate detector outputs into alarm bits.
    pub fn apply_to(&self, alarms: &mut AlarmSupervisor) {
        alarms.eval_alarm(Alarm::Weld, self.weld);
        alarms.eval_alarm(Alarm::Locked, self.locked_rotor);
        alarms.eval_alarm(Alarm::HighTemp, self.high_temp);
        if self.ghost_fatal {
            alarms.escalate(Alarm::CompGhost);
        } else {
            alarms.eval_alarm(Alarm::CompGhost, self.ghost);
        }
        alarms.eval_alarm(Alarm::CoolingFail, self.cooling_fail);
    }
}

/// Sustained high cabinet temperature.
#[derive(Debug, Clone, Default)]
pub struct HighTempMonitor {
    above_since: Option<u64>,
    active: bool,
}

impl HighTempMonitor {
    pub fn update(&mut self, air: Option<f32>, now: u64, cfg: &ControllerConfig) -> bool {
        match air {
            Some(a) if a > cfg.high_temp_alarm_c => {
                let since = *self.above_since.get_or_insert(now);
                if !self.active
                    && now.saturating_sub(since) >= u64::from(cfg.high_temp_delay_secs)
                {
                    warn!("Cabinet above {:.1}°C for {}s", cfg.high_temp_alarm_c, now - since);
                    self.active = true;
                }
            }
            Some(_) => {
                self.above_since = None;
                self.active = false;
            }
            None => {}
        }
        self.active
    }
}

/// All protection detectors.
#[derive(Debug, Clone, Default)]
pub struct ProtectionSet {
    pub freeze: FreezeGuard,
    pub power: PowerMonitor,
    pub weld: WeldDetector,
    pub cooling: CoolingMonitor,
    pub high_temp: HighTempMonitor,
}

impl ProtectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, inp: &ProtectionInputs, cfg: &ControllerConfig) -> ProtectionReport {
        let freeze_locked = self.freeze.update(inp.air, inp.now, cfg);
        let power = self
            .power
            .update(inp.relay_on, inp.run_secs, inp.power_w, inp.now, cfg);
        let weld = self.weld.update(inp.relay_on, inp.air, inp.now, cfg);
        let cooling_fail = self
            .cooling
            .update(inp.relay_on, inp.run_secs, inp.air, inp.evap, cfg);
        let high_temp = self.high_temp.update(inp.air, inp.now, cfg);

        ProtectionReport {
            freeze_locked,
            locked_rotor: power.locked_rotor,
            ghost: power.ghost,
            ghost_fatal: power.ghost_fatal,
            weld,
            cooling_fail,
            high_temp,
        }
    }
}
