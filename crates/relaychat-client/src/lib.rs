//! Relay connection adapter.
//!
//! Keeps a Socket.IO session with the relay alive and routes named inbound
//! events to subscribers.
//!
//! # Architecture
//!
//! Protocol handling is Sans-IO. [`RelaySession`] receives [`SessionEvent`]s
//! (WebSocket frames, ticks, emit requests) and returns [`SessionAction`]s
//! for the caller to execute. It never touches a socket, which keeps the
//! handshake, heartbeat and reconnect decisions testable without a relay.
//!
//! # Components
//!
//! - [`RelaySession`]: Engine.IO / Socket.IO session state machine
//! - [`Subscriptions`]: Named-event routing with drop-to-unsubscribe handles
//! - [`RelayConfig`]: Relay address and reconnect tuning
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides
//! [`transport::RelayConnection`], which drives a [`RelaySession`] over a
//! real WebSocket and reconnects with exponential backoff.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod session;
mod subscriptions;

#[cfg(feature = "transport")]
pub mod transport;

pub use config::{DEFAULT_RELAY_URL, RelayConfig, RelayEndpoint};
pub use error::{ConfigError, SessionError};
pub use event::{SessionAction, SessionEvent};
pub use relaychat_proto::{ConnectionId, EventName, InboundEvent, OutboundEvent};
pub use session::{RelaySession, SessionState};
pub use subscriptions::{Subscription, Subscriptions};
