//! Protocol decoding errors.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding relay packets.
///
/// None of these are fatal to a session: the caller logs the offending
/// packet and keeps reading.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Packet text was empty.
    #[error("empty packet")]
    EmptyPacket,

    /// Leading type digit is not defined for this layer.
    #[error("unknown {layer} packet type {found:?}")]
    UnknownPacketType {
        /// Framing layer ("engine" or "socket").
        layer: &'static str,
        /// Offending type character.
        found: char,
    },

    /// Binary event/ack packets need attachment frames, which are not used.
    #[error("binary socket packets are not supported")]
    UnsupportedBinary,

    /// Packet data was not valid JSON, or did not match the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Event array was structurally wrong (missing name, wrong arity).
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
