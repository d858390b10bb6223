//! Sensor subsystem: probe drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the air and evaporator probes and the power meter, and
//! answers the per-tick reads issued through the
//! [`SensorPort`](crate::app::ports::SensorPort) adapter.

pub mod power;
pub mod temperature;

use core::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::app::ports::{SensorId, SensorReading};
use crate::error::SensorError;
use power::PowerMeter;
use temperature::NtcProbe;

/// Atomic cache of the manual override input, written from the GPIO ISR
/// and once at boot.  `true` = button pressed.
static OVERRIDE_ACTIVE_ATOMIC: AtomicBool = AtomicBool::new(false);

/// Update the override level from an ISR or boot-time GPIO read.
/// Lock-free, safe to call from interrupt context.
pub fn set_override_from_isr(active: bool) {
    OVERRIDE_ACTIVE_ATOMIC.store(active, Ordering::Release);
}

/// Latest override level seen by the ISR.
pub fn override_active() -> bool {
    OVERRIDE_ACTIVE_ATOMIC.load(Ordering::Acquire)
}

/// Aggregates the probe drivers.
pub struct SensorHub {
    pub air: NtcProbe,
    pub evap: NtcProbe,
    pub power: PowerMeter,
    air_error: Option<SensorError>,
    evap_error: Option<SensorError>,
}

impl SensorHub {
    pub fn new(air: NtcProbe, evap: NtcProbe, power: PowerMeter) -> Self {
        Self {
            air,
            evap,
            power,
            air_error: None,
            evap_error: None,
        }
    }

    /// Read one probe.  Failures are logged once per change of error kind
    /// and reported as `None`; the health tracker decides what a missing
    /// sample means.
    pub fn read_probe(&mut self, id: SensorId, now: u64) -> Option<SensorReading> {
        let (probe, last_error) = match id {
            SensorId::Air => (&self.air, &mut self.air_error),
            SensorId::Evaporator => (&self.evap, &mut self.evap_error),
        };
        match probe.read() {
            Ok(celsius) => {
                if last_error.take().is_some() {
                    log::info!("{:?} probe recovered ({:.1} C)", id, celsius);
                }
                Some(SensorReading { celsius, at: now })
            }
            Err(e) => {
                if *last_error != Some(e) {
                    warn!("{:?} probe read failed: {}", id, e);
                    *last_error = Some(e);
                }
                None
            }
        }
    }

    pub fn read_power(&mut self) -> Option<f32> {
        self.power.read()
    }

    /// Most recent error of a probe, `None` while it reads cleanly.
    pub fn last_error(&self, id: SensorId) -> Option<SensorError> {
        match id {
            SensorId::Air => self.air_error,
            SensorId::Evaporator => self.evap_error,
        }
    }
}
