//! Session events and actions.

use relaychat_proto::{InboundEvent, OutboundEvent};

/// Input to [`crate::RelaySession::handle`].
///
/// Generic over the instant type so tests can drive virtual time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent<I> {
    /// WebSocket connection established.
    Opened {
        /// Current time.
        now: I,
    },

    /// Text frame received from the relay.
    TextReceived {
        /// Frame contents.
        text: String,
        /// Current time.
        now: I,
    },

    /// WebSocket closed or failed.
    Closed,

    /// Periodic liveness check.
    Tick {
        /// Current time.
        now: I,
    },

    /// Caller wants to emit an event to the relay.
    Emit(OutboundEvent),
}

/// Output of [`crate::RelaySession::handle`], executed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Write a text frame to the WebSocket.
    SendText(String),

    /// Hand an inbound event to subscribers.
    Deliver(InboundEvent),

    /// Drop the WebSocket and reconnect after backoff.
    Reconnect {
        /// Why the session gave up.
        reason: String,
    },
}
