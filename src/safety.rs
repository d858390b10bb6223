//! Alarm supervisor.
//!
//! Detectors report conditions every tick; the supervisor accumulates them
//! in an alarm bitmask and logs each set / clear edge once.  The cascade
//! reads the mask to decide whether to force the compressor off.
//!
//! ## Alarm lifecycle
//!
//! 1. A detector reports a condition (e.g. weld suspected).
//! 2. The supervisor sets the corresponding bit.
//! 3. Non-fatal alarms clear themselves when the condition goes away.
//! 4. Fatal alarms (and escalated ones) are sticky: only an explicit reset
//!    clears them, and a remote reset only when configuration allows it.
//!
//! Multiple alarms may be active at once; the status report carries the
//! most severe one.

use core::fmt;

use log::{error, info, warn};
use serde::Serialize;

/// Alarm severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Forces the compressor off until explicitly reset.
    Fatal,
    /// Reported; no effect on the decision.
    Critical,
    /// Puts the controller into limp mode.
    Error,
    /// Informational.
    Warning,
}

/// Alarm bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum Alarm {
    /// Relay contacts fused: cabinet keeps cooling with the relay off.
    #[serde(rename = "WELD")]
    Weld = 0b0000_0001,
    /// Motor drawing locked-rotor current.
    #[serde(rename = "LOCKED")]
    Locked = 0b0000_0010,
    /// Cabinet too warm for too long.
    #[serde(rename = "HIGH_TEMP")]
    HighTemp = 0b0000_0100,
    /// Air probe has failed.
    #[serde(rename = "SENSOR_FAIL")]
    SensorFail = 0b0000_1000,
    /// Air probe reading frozen.
    #[serde(rename = "SENSOR_STUCK")]
    SensorStuck = 0b0001_0000,
    /// Relay on but the compressor draws no power.
    #[serde(rename = "COMP_GHOST")]
    CompGhost = 0b0010_0000,
    /// Evaporator not pulling heat out of the cabinet.
    #[serde(rename = "COOLING_FAIL")]
    CoolingFail = 0b0100_0000,
}

/// Bits that are fatal on their own.
pub const FATAL_MASK: u8 = Alarm::Weld.mask() | Alarm::Locked.mask();

impl Alarm {
    /// All alarms, most severe first.
    pub const ALL: [Alarm; 7] = [
        Alarm::Weld,
        Alarm::Locked,
        Alarm::HighTemp,
        Alarm::SensorFail,
        Alarm::SensorStuck,
        Alarm::CompGhost,
        Alarm::CoolingFail,
    ];

    /// Return the bitmask for this alarm.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::Weld | Self::Locked => Severity::Fatal,
            Self::HighTemp => Severity::Critical,
            Self::SensorFail | Self::SensorStuck => Severity::Error,
            Self::CompGhost | Self::CoolingFail => Severity::Warning,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weld => "WELD",
            Self::Locked => "LOCKED",
            Self::HighTemp => "HIGH_TEMP",
            Self::SensorFail => "SENSOR_FAIL",
            Self::SensorStuck => "SENSOR_STUCK",
            Self::CompGhost => "COMP_GHOST",
            Self::CoolingFail => "COOLING_FAIL",
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alarm supervisor.
#[derive(Debug, Clone, Default)]
pub struct AlarmSupervisor {
    /// Active alarm bitmask.
    active: u8,
    /// Alarms escalated to fatal (sticky regardless of their own severity).
    escalated: u8,
}

impl AlarmSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear an alarm from a boolean condition.  Sticky alarms are
    /// never cleared here.
    pub fn eval_alarm(&mut self, alarm: Alarm, condition: bool) {
        if condition {
            self.raise(alarm);
        } else if self.active & alarm.mask() != 0 && !self.is_sticky(alarm) {
            info!("ALARM CLEARED: {alarm}");
            self.active &= !alarm.mask();
        }
    }

    /// Raise an alarm (edge-logged).
    pub fn raise(&mut self, alarm: Alarm) {
        if self.active & alarm.mask() == 0 {
            match alarm.severity() {
                Severity::Fatal => error!("ALARM SET (fatal): {alarm}"),
                Severity::Critical | Severity::Error => error!("ALARM SET: {alarm}"),
                Severity::Warning => warn!("ALARM SET: {alarm}"),
            }
        }
        self.active |= alarm.mask();
    }

    /// Promote an alarm to fatal.  It stays active until an explicit reset.
    pub fn escalate(&mut self, alarm: Alarm) {
        self.raise(alarm);
        if self.escalated & alarm.mask() == 0 {
            error!("ALARM ESCALATED to fatal: {alarm}");
        }
        self.escalated |= alarm.mask();
    }

    /// Explicit reset.  Non-fatal alarms always clear (they re-raise next
    /// tick if their condition persists); fatal and escalated alarms clear
    /// only when `include_fatal` is set.  Returns the cleared bits.
    pub fn reset(&mut self, include_fatal: bool) -> u8 {
        let sticky = self.sticky_mask();
        let keep = if include_fatal { 0 } else { sticky };
        let cleared = self.active & !keep;
        self.active &= keep;
        if include_fatal {
            self.escalated = 0;
        }
        if cleared != 0 {
            info!("Alarms reset (mask=0b{:07b})", cleared);
        }
        cleared
    }

    /// Current alarm bitmask.
    pub fn mask(&self) -> u8 {
        self.active
    }

    pub fn is_active(&self, alarm: Alarm) -> bool {
        self.active & alarm.mask() != 0
    }

    /// Any fatal or escalated alarm is active.
    pub fn is_fatal(&self) -> bool {
        self.active & self.sticky_mask() != 0
    }

    /// Most severe active alarm.
    pub fn highest(&self) -> Option<Alarm> {
        let escalated = Alarm::ALL
            .into_iter()
            .find(|a| self.escalated & a.mask() != 0 && self.is_active(*a));
        escalated.or_else(|| Alarm::ALL.into_iter().find(|a| self.is_active(*a)))
    }

    /// Sticky bits to persist across restarts: `(active fatal, escalated)`.
    pub fn latch(&self) -> (u8, u8) {
        (self.active & self.sticky_mask(), self.escalated)
    }

    /// Restore sticky alarms from a persisted latch.
    pub fn restore_latch(&mut self, fatal: u8, escalated: u8) {
        self.escalated = escalated;
        self.active |= fatal | escalated;
        if self.is_fatal() {
            error!("Restored latched fatal alarms (mask=0b{:07b})", self.active);
        }
    }

    // ── Internal ──────────────────────────────────────────────────

    fn sticky_mask(&self) -> u8 {
        FATAL_MASK | self.escalated
    }

    fn is_sticky(&self, alarm: Alarm) -> bool {
        self.sticky_mask() & alarm.mask() != 0
    }
}
