//! Application side-effects.
//!
//! [`AppAction`]s are produced by the [`crate::App`] state machine for the
//! runtime to execute.

use relaychat_proto::OutboundEvent;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Send an event to the relay. Fire-and-forget.
    Emit(OutboundEvent),
}
