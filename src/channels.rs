//! Inter-task communication channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to bridge interrupt / timer
//! context and the console task with the synchronous control loop.  All
//! producers share these static channels without heap allocation.
//!
//! ```text
//! ┌──────────────┐  ControlCommand  ┌──────────────┐
//! │ Console /    │─────────────────▶│              │
//! │ front panel  │                  │ Control Loop │
//! └──────────────┘                  │  (sync)      │
//! ┌──────────────┐     RelayAck     │              │
//! │ Relay driver │─────────────────▶│              │
//! └──────────────┘                  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::commands::ControlCommand;
use crate::app::ports::RelayAck;

/// Channel depth for inbound commands.
const CMD_DEPTH: usize = 8;

/// Channel depth for relay acknowledgements.
pub const ACK_DEPTH: usize = 4;

/// Channel type the relay driver posts acknowledgements into.
pub type AckChannel = Channel<CriticalSectionRawMutex, RelayAck, ACK_DEPTH>;

/// Inbound command channel: console / panel → control loop.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, ControlCommand, CMD_DEPTH> =
    Channel::new();

/// Relay acknowledgement channel: relay driver → control loop.
pub static RELAY_ACK_CHANNEL: AckChannel = Channel::new();

/// Queue a command for the next loop iteration.  Returns `false` when the
/// channel is full and the command was dropped.
pub fn submit_command(cmd: ControlCommand) -> bool {
    match COMMAND_CHANNEL.try_send(cmd) {
        Ok(()) => {
            crate::events::push_event(crate::events::Event::CommandReceived);
            true
        }
        Err(_) => {
            log::warn!("Command channel full, command dropped");
            false
        }
    }
}

/// Next pending command, if any.
pub fn next_command() -> Option<ControlCommand> {
    COMMAND_CHANNEL.try_receive().ok()
}
