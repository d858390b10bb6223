//! Compressor relay driver.
//!
//! Drives the relay coil through any `embedded-hal` output pin and,
//! when the board has an auxiliary contact wired back, verifies the
//! switch through an input pin.  Outcomes are posted as [`RelayAck`]s on
//! a bounded channel and collected by the control loop on the next tick.
//!
//! ## Safety contract
//!
//! The driver is a dumb actuator: minimum run/off times and every other
//! protection are enforced by the controller before a command arrives.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: generic over `esp-idf-hal` `PinDriver`s built in `main`.
//! On host/test: [`SimCoil`] / [`SimContact`] track levels in memory.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::{info, warn};

use crate::app::ports::RelayAck;
use crate::channels::AckChannel;
use crate::error::ActuatorError;

pub struct RelayDriver<O, I> {
    coil: O,
    feedback: Option<I>,
    acks: &'static AckChannel,
    /// Last level written to the coil, `None` before the first command.
    commanded: Option<bool>,
    /// Level the feedback contact should show on the next verification.
    awaiting: Option<bool>,
    /// Contact (or coil) level sampled at construction.
    boot_level: bool,
}

impl<O: OutputPin, I: InputPin> RelayDriver<O, I> {
    /// Take ownership of the relay pins.  The coil is left untouched so
    /// boot reconciliation sees the level the previous run left behind.
    pub fn new(coil: O, mut feedback: Option<I>, acks: &'static AckChannel) -> Self {
        let boot_level = match feedback.as_mut() {
            Some(pin) => pin.is_high().unwrap_or(false),
            None => false,
        };
        info!(
            "Relay: driver ready (feedback {}, boot level {})",
            if feedback.is_some() { "fitted" } else { "absent" },
            if boot_level { "ON" } else { "OFF" }
        );
        Self {
            coil,
            feedback,
            acks,
            commanded: None,
            awaiting: None,
            boot_level,
        }
    }

    /// Drive the coil.  Returns `false` when the GPIO write failed or a
    /// previous command is still waiting for verification.
    pub fn set(&mut self, on: bool) -> bool {
        if self.awaiting.is_some() {
            warn!("Relay: command refused, previous switch not yet verified");
            return false;
        }
        if let Err(e) = self.coil.set_state(PinState::from(on)) {
            warn!("Relay: coil write failed: {:?}", e);
            return false;
        }
        self.commanded = Some(on);

        if self.feedback.is_some() {
            self.awaiting = Some(on);
        } else {
            self.post(RelayAck::Confirmed(on));
        }
        true
    }

    /// Compare the feedback contact with the last command and post the
    /// outcome.  No-op when nothing is awaiting verification.
    pub fn verify(&mut self) {
        let Some(expected) = self.awaiting.take() else {
            return;
        };
        let Some(pin) = self.feedback.as_mut() else {
            return;
        };
        match pin.is_high() {
            Ok(level) if level == expected => self.post(RelayAck::Confirmed(expected)),
            Ok(_) => {
                warn!(
                    "Relay: contact did not follow coil (expected {})",
                    if expected { "closed" } else { "open" }
                );
                self.post(RelayAck::Failed(ActuatorError::FeedbackMismatch));
            }
            Err(e) => {
                warn!("Relay: feedback read failed: {:?}", e);
                self.awaiting = Some(expected);
            }
        }
    }

    /// Verify any pending switch, then hand out the oldest acknowledgement.
    pub fn poll_ack(&mut self) -> Option<RelayAck> {
        self.verify();
        self.acks.try_receive().ok()
    }

    /// Level the relay is believed to be at.
    pub fn level(&self) -> bool {
        self.commanded.unwrap_or(self.boot_level)
    }

    fn post(&self, ack: RelayAck) {
        if self.acks.try_send(ack).is_err() {
            warn!("Relay: ack channel full, {:?} dropped", ack);
        }
    }
}

// ── Simulated pins ────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::{SimCoil, SimContact};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

    /// In-memory coil.  Shares its level with any [`SimContact`] created
    /// from it so the contact follows the coil like a healthy relay.
    #[derive(Clone, Default)]
    pub struct SimCoil {
        level: Rc<Cell<bool>>,
    }

    impl SimCoil {
        pub fn new(initial: bool) -> Self {
            Self { level: Rc::new(Cell::new(initial)) }
        }

        pub fn is_energised(&self) -> bool {
            self.level.get()
        }

        /// A contact wired to this coil.
        pub fn contact(&self) -> SimContact {
            SimContact { level: Rc::clone(&self.level) }
        }
    }

    impl ErrorType for SimCoil {
        type Error = Infallible;
    }

    impl OutputPin for SimCoil {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level.set(true);
            Ok(())
        }
    }

    /// In-memory auxiliary contact.
    #[derive(Clone)]
    pub struct SimContact {
        level: Rc<Cell<bool>>,
    }

    impl SimContact {
        /// A contact not wired to any coil, stuck at `level`.
        pub fn stuck(level: bool) -> Self {
            Self { level: Rc::new(Cell::new(level)) }
        }
    }

    impl ErrorType for SimContact {
        type Error = Infallible;
    }

    impl InputPin for SimContact {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.level.get())
        }
    }
}
