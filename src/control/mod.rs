//! Control-loop building blocks.
//!
//! Every component here is plain data plus methods taking
//! `&ControllerConfig`; none of them touch hardware.  The service wires
//! them together once per tick.

pub mod adaptive;
pub mod defrost;
pub mod door;
pub mod health;
pub mod limp;
pub mod protection;
pub mod signal;
pub mod stats;
pub mod timing;
