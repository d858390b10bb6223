//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | ESP32 ADC, GPIO          |
//! |                | RelayPort          | Relay coil + contact     |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | ConfigPort         | NVS / in-memory store    |
//! |                | StoragePort        |                          |
//! | `time`         | ClockPort          | ESP32 timer, wall clock  |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
