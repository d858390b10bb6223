//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService (domain)
//! ```
//!
//! Driven adapters (sensors, relay, clock, event sinks, storage) implement
//! these traits.  The [`ControllerService`](super::service::ControllerService)
//! consumes them via generics, so the control core never touches hardware
//! directly.
//!
//! ## Safety notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **RelayPort** may actuate asynchronously; the core tracks what it
//!   asked for separately from what the relay confirmed.
//! - All port errors are typed; callers must handle every variant explicitly.

use crate::config::ControllerConfig;
use crate::error::ActuatorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature probes known to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    /// Cabinet air probe.
    Air,
    /// Evaporator coil probe.
    Evaporator,
}

/// Digital inputs known to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    /// Front-panel manual override button (active = pressed).
    ManualOverride,
}

/// A valid temperature reading with the time it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub celsius: f32,
    /// Monotonic seconds at which the sample was taken.
    pub at: u64,
}

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read a temperature probe.  `None` when the probe is absent, shorted,
    /// open or otherwise unreadable this tick.
    fn read_sensor(&mut self, id: SensorId) -> Option<SensorReading>;

    /// Compressor electrical power in watts, `None` when no meter is fitted.
    fn read_power(&mut self) -> Option<f32>;

    /// Current level of a digital input.
    fn read_digital_input(&mut self, id: InputId) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Asynchronous outcome of a relay command, delivered on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAck {
    /// The relay reached the given state.
    Confirmed(bool),
    /// The command failed; the relay state is unchanged.
    Failed(ActuatorError),
}

/// Write-side port: the domain calls this to command the compressor relay.
pub trait RelayPort {
    /// Request a relay state.  Returns `true` when the command was accepted
    /// for execution; confirmation arrives later through [`poll_ack`].
    ///
    /// [`poll_ack`]: RelayPort::poll_ack
    fn set_relay(&mut self, on: bool) -> bool;

    /// Live hardware level of the relay, read at boot for reconciliation.
    fn relay_state(&self) -> bool;

    /// Next pending confirmation or error, if any.
    fn poll_ack(&mut self) -> Option<RelayAck>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time sources.  Tick logic runs on the monotonic clock; the wall clock
/// is only used for boot reconciliation and the defrost schedule.
pub trait ClockPort {
    /// Seconds since boot (monotonic, never goes backwards).
    fn monotonic_secs(&self) -> u64;

    /// Unix seconds, `None` until the wall clock is synced.
    fn wall_secs(&self) -> Option<u64>;

    /// Local hour-of-day (0–23), `None` until the wall clock is synced.
    fn local_hour(&self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ControllerEvent`](super::events::ControllerEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// display, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// # Safety
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped, so a remote update cannot disable a protection
/// (e.g. by pushing `freeze_cutoff_c` below the band).
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ControllerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for controller state and the fault log.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
