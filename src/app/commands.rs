//! Inbound commands to the controller service.
//!
//! These represent actions requested by the outside world (front panel,
//! serial console, remote link) that the
//! [`ControllerService`](super::service::ControllerService) interprets and
//! acts upon.

use crate::config::ControllerConfig;

/// Commands that external adapters can send into the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Change the cabinet setpoint (°C).  Rejected outside the setpoint
    /// limits.
    SetSetpoint(f32),

    /// Enable or disable turbo pull-down.
    SetTurbo(bool),

    /// Clear alarms.  Fatal alarms are only cleared by a local reset, or by
    /// a remote one when `allow_remote_fatal_reset` is set.
    ResetAlarms { remote: bool },

    /// Emit a full JSON status dump.
    DumpStatus,

    /// Start a fixed-duration defrost now.
    StartDefrost,

    /// Hot-reload configuration; validated before it takes effect.
    UpdateConfig(ControllerConfig),

    /// Persist controller state and configuration immediately.
    SaveState,

    /// Erase the stored fault log.
    ClearFaults,
}

/// Why a command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRejection {
    SetpointOutOfRange,
    InvalidConfig(&'static str),
    DefrostUnavailable,
    FatalResetNotAllowed,
}

impl core::fmt::Display for CommandRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SetpointOutOfRange => write!(f, "setpoint out of range"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::DefrostUnavailable => write!(f, "defrost not possible now"),
            Self::FatalResetNotAllowed => write!(f, "remote fatal reset disabled"),
        }
    }
}
