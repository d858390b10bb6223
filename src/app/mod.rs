//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration of the ColdGuard controller:
//! the per-tick pipeline, command handling, persistence triggers and the
//! status report.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
