//! Outbound controller events.
//!
//! The [`ControllerService`](super::service::ControllerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to serial, publish upstream,
//! update a display, etc.

use heapless::String;
use serde::Serialize;

use crate::boot::BootCase;
use crate::codes::{ReasonCode, StatusCode};
use crate::safety::Alarm;

use super::commands::CommandRejection;

/// Structured events emitted by the controller core.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Per-tick status report.
    Status(StatusReport),

    /// Boot reconciliation finished.
    Started(BootCase),

    /// A relay command was accepted.
    RelaySwitched { on: bool, reason: ReasonCode },

    /// An alarm bit was set.
    AlarmRaised(Alarm),

    /// All alarms cleared by a reset (carries the cleared mask).
    AlarmsReset(u8),

    /// A command was refused.
    CommandRejected(CommandRejection),

    /// A tick failed; the fault was logged.
    TickFault(crate::error::Error),

    /// JSON status dump requested by [`DumpStatus`](super::commands::ControlCommand::DumpStatus).
    StatusDump(String<STATUS_DUMP_CAPACITY>),
}

/// Maximum size of a JSON status dump.
pub const STATUS_DUMP_CAPACITY: usize = 1024;

/// Health flags of one probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeFlags {
    pub offline: bool,
    pub critical: bool,
    pub stuck: bool,
}

/// A point-in-time status snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub uptime_secs: u64,
    pub status: StatusCode,
    pub reason: ReasonCode,
    /// Most severe active alarm.
    pub alarm: Option<Alarm>,
    pub alarm_mask: u8,

    pub air_raw_c: Option<f32>,
    pub air_c: Option<f32>,
    pub evap_raw_c: Option<f32>,
    pub evap_c: Option<f32>,
    pub air_flags: ProbeFlags,
    pub evap_flags: ProbeFlags,

    pub relay_on: bool,
    pub relay_confirmed: bool,
    pub relay_stuck: bool,
    pub relay_errors: u32,
    pub power_w: Option<f32>,

    pub duty_hour_pct: f32,
    pub duty_day_pct: f32,
    pub duty_life_pct: f32,
    pub cycles: u32,
    pub avg_on_secs: Option<u32>,
    pub avg_off_secs: Option<u32>,

    pub setpoint_c: f32,
    pub hysteresis_c: f32,

    pub defrost: bool,
    pub door_open: bool,
    pub turbo: bool,
    pub limp: bool,
    /// Cooling-health metric: air − evaporator (°C).
    pub cooling_delta_c: Option<f32>,
}

impl StatusReport {
    /// Render as JSON into a fixed-capacity string.  Truncation is
    /// reported as an error.
    pub fn to_json(&self) -> Result<String<STATUS_DUMP_CAPACITY>, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let mut out = String::new();
        out.push_str(&json).map_err(|_| {
            <serde_json::Error as serde::ser::Error>::custom("status dump exceeds capacity")
        })?;
        Ok(out)
    }
}
