//! Interrupt-driven event flags.
//!
//! Events are produced by:
//! - Timer callbacks (control tick, watchdog heartbeat)
//! - GPIO ISRs (manual override button, relay feedback contact)
//! - Software (a command was queued on the command channel)
//!
//! Each event kind is one bit in a shared atomic word.  Producers set
//! their bit, the main loop takes the whole word at once.  Repeats of a
//! pending event coalesce, so a stalled loop wakes up to one control tick
//! instead of a burst of them, and the flags can never overflow.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Timer cb    │──┐  │              │     │              │
//! │ GPIO ISR    │──┼─▶│ pending bits │────▶│  Main Loop   │
//! │ Software    │──┘  │ (fetch_or)   │     │  (swap 0)    │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// System event types.  Declaration order is dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Watchdog heartbeat.
    WatchdogTick = 1 << 0,
    /// Relay feedback contact changed level.
    RelayFeedback = 1 << 1,
    /// Manual override input changed level.
    OverrideEdge = 1 << 2,
    /// A command is waiting on the command channel.
    CommandReceived = 1 << 3,
    /// Control loop timer fired.
    ControlTick = 1 << 4,
}

impl Event {
    /// Every event, in dispatch order.
    pub const ALL: [Event; 5] = [
        Event::WatchdogTick,
        Event::RelayFeedback,
        Event::OverrideEdge,
        Event::CommandReceived,
        Event::ControlTick,
    ];

    pub const fn bit(self) -> u8 {
        self as u8
    }
}

static PENDING: AtomicU8 = AtomicU8::new(0);

/// Flag an event.  Lock-free; callable from ISR and timer context.
/// Returns `false` when the event was already pending (coalesced).
pub fn push_event(event: Event) -> bool {
    PENDING.fetch_or(event.bit(), Ordering::AcqRel) & event.bit() == 0
}

/// Take every pending event and dispatch them in [`Event::ALL`] order.
/// Events raised by the handler are picked up on the next call.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    let pending = PENDING.swap(0, Ordering::AcqRel);
    for event in Event::ALL {
        if pending & event.bit() != 0 {
            handler(event);
        }
    }
}

/// Whether `event` is waiting to be dispatched.
pub fn is_pending(event: Event) -> bool {
    PENDING.load(Ordering::Acquire) & event.bit() != 0
}

/// Number of distinct events waiting.
pub fn pending_count() -> u32 {
    PENDING.load(Ordering::Acquire).count_ones()
}
