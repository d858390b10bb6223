//! Mock adapters for integration tests.
//!
//! `MockHardware` stands in for the probes, the override button and the
//! relay; every relay command is recorded so tests can assert on the full
//! switching history.  The relay acknowledges each accepted command on
//! the next poll, like a healthy contact.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use coldguard::app::events::{ControllerEvent, StatusReport};
use coldguard::app::ports::{
    ClockPort, ConfigError, ConfigPort, EventSink, InputId, RelayAck, RelayPort, SensorId,
    SensorPort, SensorReading, StorageError, StoragePort,
};
use coldguard::config::ControllerConfig;
use coldguard::error::ActuatorError;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub air_c: Option<f32>,
    pub evap_c: Option<f32>,
    pub power_w: Option<f32>,
    pub override_pressed: bool,
    /// Level the relay is at.
    pub relay_on: bool,
    /// Every accepted relay command, oldest first.
    pub relay_calls: Vec<bool>,
    /// Refuse every command (driver busy / GPIO failure).
    pub refuse_commands: bool,
    /// Report every command as failed on the next poll.
    pub fail_acks: bool,
    acks: VecDeque<RelayAck>,
    now: u64,
}

#[allow(dead_code)]
impl MockHardware {
    /// Cabinet at 7 °C, evaporator at −10 °C, relay off, no power meter.
    pub fn new() -> Self {
        Self {
            air_c: Some(7.0),
            evap_c: Some(-10.0),
            power_w: None,
            override_pressed: false,
            relay_on: false,
            relay_calls: Vec::new(),
            refuse_commands: false,
            fail_acks: false,
            acks: VecDeque::new(),
            now: 0,
        }
    }

    /// Relay already energised when the controller boots.
    pub fn with_relay_on() -> Self {
        Self {
            relay_on: true,
            ..Self::new()
        }
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    pub fn switch_count(&self) -> usize {
        self.relay_calls.len()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_sensor(&mut self, id: SensorId) -> Option<SensorReading> {
        let celsius = match id {
            SensorId::Air => self.air_c,
            SensorId::Evaporator => self.evap_c,
        }?;
        Some(SensorReading { celsius, at: self.now })
    }

    fn read_power(&mut self) -> Option<f32> {
        self.power_w
    }

    fn read_digital_input(&mut self, id: InputId) -> bool {
        match id {
            InputId::ManualOverride => self.override_pressed,
        }
    }
}

impl RelayPort for MockHardware {
    fn set_relay(&mut self, on: bool) -> bool {
        if self.refuse_commands {
            return false;
        }
        self.relay_calls.push(on);
        if self.fail_acks {
            self.acks.push_back(RelayAck::Failed(ActuatorError::FeedbackMismatch));
        } else {
            self.relay_on = on;
            self.acks.push_back(RelayAck::Confirmed(on));
        }
        true
    }

    fn relay_state(&self) -> bool {
        self.relay_on
    }

    fn poll_ack(&mut self) -> Option<RelayAck> {
        self.acks.pop_front()
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Monotonic clock driven by the test.  The wall clock, when set, runs
/// in lockstep from `wall_base`.
pub struct MockClock {
    mono: Cell<u64>,
    wall_base: Option<u64>,
    pub hour: Cell<Option<u8>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            mono: Cell::new(0),
            wall_base: None,
            hour: Cell::new(None),
        }
    }

    pub fn with_wall(wall_base: u64) -> Self {
        Self {
            wall_base: Some(wall_base),
            ..Self::new()
        }
    }

    pub fn set(&self, secs: u64) {
        self.mono.set(secs);
    }

    pub fn advance(&self, secs: u64) {
        self.mono.set(self.mono.get() + secs);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockClock {
    fn monotonic_secs(&self) -> u64 {
        self.mono.get()
    }

    fn wall_secs(&self) -> Option<u64> {
        self.wall_base.map(|w| w + self.mono.get())
    }

    fn local_hour(&self) -> Option<u8> {
        self.hour.get()
    }
}

// ── MockStorage ───────────────────────────────────────────────

pub struct MockStorage {
    store: HashMap<String, Vec<u8>>,
    config: RefCell<Option<ControllerConfig>>,
    pub config_saves: Cell<u32>,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            config: RefCell::new(None),
            config_saves: Cell::new(0),
        }
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.exists(namespace, key)
    }

    pub fn saved_config(&self) -> Option<ControllerConfig> {
        self.config.borrow().clone()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

impl ConfigPort for MockStorage {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        Ok(self.config.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.borrow_mut() = Some(config.clone());
        self.config_saves.set(self.config_saves.get() + 1);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Keeps every emitted event.
pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn last_status(&self) -> Option<&StatusReport> {
        self.events.iter().rev().find_map(|e| match e {
            ControllerEvent::Status(report) => Some(report),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(event.clone());
    }
}
