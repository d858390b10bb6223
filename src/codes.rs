//! Status and reason codes reported with every decision.
//!
//! These are the stable wire vocabulary of the controller: the status
//! report carries them as their `as_str()` names.

use core::fmt;

use serde::Serialize;

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Boot reconciliation has not run yet.
    Boot,
    Idle,
    Cooling,
    /// Wants to stop but the minimum run time holds the relay on.
    WantIdle,
    /// Wants to start but the minimum rest time holds the relay off.
    WantCool,
    LimpIdle,
    LimpCool,
    TurboCool,
    TurboIdle,
}

impl StatusCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Idle => "IDLE",
            Self::Cooling => "COOLING",
            Self::WantIdle => "WANT_IDLE",
            Self::WantCool => "WANT_COOL",
            Self::LimpIdle => "LIMP_IDLE",
            Self::LimpCool => "LIMP_COOL",
            Self::TurboCool => "TURBO_COOL",
            Self::TurboIdle => "TURBO_IDLE",
        }
    }

    /// True for every status in which the relay is (intended) on.
    pub const fn is_running(self) -> bool {
        matches!(
            self,
            Self::Cooling | Self::WantIdle | Self::LimpCool | Self::TurboCool
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the current status was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReasonCode {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "PROT_MIN_ON")]
    ProtMinOn,
    #[serde(rename = "PROT_MIN_OFF")]
    ProtMinOff,
    #[serde(rename = "PROT_MAX_ON")]
    ProtMaxOn,
    #[serde(rename = "PROT_AIR_FRZ")]
    ProtAirFreeze,
    #[serde(rename = "PROT_DOOR_OPEN")]
    ProtDoorOpen,
    #[serde(rename = "DEFR_SCHED")]
    DefrostScheduled,
    #[serde(rename = "DEFR_TRIG")]
    DefrostTriggered,
    #[serde(rename = "DEFR_DYN")]
    DefrostDynamic,
}

impl ReasonCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ProtMinOn => "PROT_MIN_ON",
            Self::ProtMinOff => "PROT_MIN_OFF",
            Self::ProtMaxOn => "PROT_MAX_ON",
            Self::ProtAirFreeze => "PROT_AIR_FRZ",
            Self::ProtDoorOpen => "PROT_DOOR_OPEN",
            Self::DefrostScheduled => "DEFR_SCHED",
            Self::DefrostTriggered => "DEFR_TRIG",
            Self::DefrostDynamic => "DEFR_DYN",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
