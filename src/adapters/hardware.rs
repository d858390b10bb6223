//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the [`RelayDriver`], exposing them through
//! [`SensorPort`] and [`RelayPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{InputId, RelayAck, RelayPort, SensorId, SensorPort, SensorReading};
use crate::drivers::relay::RelayDriver;
use crate::sensors::{self, SensorHub};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<O, I, C> {
    sensor_hub: SensorHub,
    relay: RelayDriver<O, I>,
    clock: C,
}

impl<O, I, C> HardwareAdapter<O, I, C>
where
    O: OutputPin,
    I: InputPin,
    C: crate::app::ports::ClockPort,
{
    /// `clock` stamps the sensor readings.
    pub fn new(sensor_hub: SensorHub, relay: RelayDriver<O, I>, clock: C) -> Self {
        Self {
            sensor_hub,
            relay,
            clock,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<O, I, C> SensorPort for HardwareAdapter<O, I, C>
where
    O: OutputPin,
    I: InputPin,
    C: crate::app::ports::ClockPort,
{
    fn read_sensor(&mut self, id: SensorId) -> Option<SensorReading> {
        let now = self.clock.monotonic_secs();
        self.sensor_hub.read_probe(id, now)
    }

    fn read_power(&mut self) -> Option<f32> {
        self.sensor_hub.read_power()
    }

    fn read_digital_input(&mut self, id: InputId) -> bool {
        match id {
            InputId::ManualOverride => sensors::override_active(),
        }
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<O, I, C> RelayPort for HardwareAdapter<O, I, C>
where
    O: OutputPin,
    I: InputPin,
    C: crate::app::ports::ClockPort,
{
    fn set_relay(&mut self, on: bool) -> bool {
        self.relay.set(on)
    }

    fn relay_state(&self) -> bool {
        self.relay.level()
    }

    fn poll_ack(&mut self) -> Option<RelayAck> {
        self.relay.poll_ack()
    }
}
