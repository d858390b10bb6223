//! Unified error types for the ColdGuard firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's tick boundary uniform. All variants are `Copy` so they can
//! be passed through the fault log and the service without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// A relay command failed.
    Actuator(ActuatorError),
    /// Persisted state could not be encoded, decoded or written.
    Storage(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// An internal invariant did not hold during a tick.
    Internal(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Internal(msg) => write!(f, "internal: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Thermistor circuit is open (reads full scale).
    OpenCircuit,
    /// Thermistor circuit is shorted (reads zero).
    ShortCircuit,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OpenCircuit => write!(f, "open circuit"),
            Self::ShortCircuit => write!(f, "short circuit"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set on the relay coil failed.
    GpioWriteFailed,
    /// Relay feedback contact disagrees with the coil command.
    FeedbackMismatch,
    /// The relay driver is busy with a previous command.
    Busy,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::FeedbackMismatch => write!(f, "relay feedback mismatch"),
            Self::Busy => write!(f, "relay busy"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<crate::app::ports::ConfigError> for Error {
    fn from(e: crate::app::ports::ConfigError) -> Self {
        match e {
            crate::app::ports::ConfigError::ValidationFailed(msg) => Self::Config(msg),
            _ => Self::Config("config storage failure"),
        }
    }
}

impl From<crate::app::ports::StorageError> for Error {
    fn from(e: crate::app::ports::StorageError) -> Self {
        match e {
            crate::app::ports::StorageError::NotFound => Self::Storage("key not found"),
            crate::app::ports::StorageError::Full => Self::Storage("storage full"),
            crate::app::ports::StorageError::IoError => Self::Storage("I/O error"),
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Self::Storage("postcard codec error")
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
