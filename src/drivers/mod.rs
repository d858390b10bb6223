//! Relay driver, hardware initialisation, timers and the watchdog.

pub mod hw_init;
pub mod hw_timer;
pub mod relay;
pub mod watchdog;
