//! Client error types.

use relaychat_proto::ProtocolError;
use thiserror::Error;

/// Errors from feeding a frame into [`crate::RelaySession`].
///
/// The session stays usable after any of these. The offending frame is
/// dropped and the caller should log and keep reading.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Packet is valid but not expected in the current state.
    #[error("unexpected {packet} packet while {state}")]
    UnexpectedPacket {
        /// Packet description.
        packet: &'static str,
        /// Session state name.
        state: &'static str,
    },

    /// Relay confirmed the namespace without a connection id.
    #[error("connect confirmation has no connection id")]
    MissingConnectionId,
}

/// Errors in the relay address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Scheme is not one of http, https, ws, wss.
    #[error("unsupported relay scheme in {0:?}")]
    UnsupportedScheme(String),

    /// No host between the scheme and the path.
    #[error("relay address {0:?} has no host")]
    MissingHost(String),
}
