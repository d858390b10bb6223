//! ColdGuard controller library.
//!
//! Exposes the control core, the port traits and the adapters for
//! integration testing and the firmware binary.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod boot;
pub mod cascade;
pub mod channels;
pub mod codes;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod persist;
pub mod safety;
pub mod state;

pub mod pins;

// Dual-target modules: real peripherals on ESP-IDF, simulated on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
