//! Application input events.
//!
//! Events originate from two sources: user interaction (keys, resize, clock
//! ticks) and inbound relay events delivered by the connection adapter.

use relaychat_proto::InboundEvent;

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent<I> {
    /// Keyboard input.
    Key(KeyInput),

    /// Clock tick. Expires the notice once its deadline has passed.
    Tick {
        /// Current time.
        now: I,
    },

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Event from the relay.
    Relay {
        /// Decoded event.
        event: InboundEvent,
        /// Arrival time.
        now: I,
    },
}
