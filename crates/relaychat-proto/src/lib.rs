//! Relay wire contract for relaychat.
//!
//! The relay speaks Socket.IO (v5) on top of Engine.IO (v4) over a WebSocket.
//! Only text packets are used. This crate owns both layers of that framing
//! plus the typed events carried inside them:
//!
//! - [`EnginePacket`]: transport-level packets (open, ping/pong, message).
//! - [`SocketPacket`]: namespace-level packets (connect, event, errors).
//! - [`InboundEvent`] / [`OutboundEvent`]: the named events exchanged with the
//!   relay, with their JSON payloads decoded into [`ChatMessage`] and friends.
//!
//! Nothing in here performs I/O. Decoding is total over `&str`: malformed
//! input produces a [`ProtocolError`], never a panic.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod event;
mod message;
mod packet;

pub use errors::{ProtocolError, Result};
pub use event::{ConnectionId, EventName, InboundEvent, OutboundEvent, TypingUpdate};
pub use message::{ChatMessage, SYSTEM_SENDER_ID};
pub use packet::{DEFAULT_NAMESPACE, EnginePacket, Handshake, SocketPacket, SocketPacketKind};

/// Encode an outbound event as a complete Engine.IO text frame.
///
/// The result is ready to be written to the WebSocket as-is, e.g.
/// `42["typing",true]`.
pub fn encode_outbound(event: &OutboundEvent) -> Result<String> {
    let packet = SocketPacket::event(DEFAULT_NAMESPACE, event.to_args());
    EnginePacket::Message(packet.encode()).encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_frames_match_socket_io_layout() {
        let frame = encode_outbound(&OutboundEvent::SetUsername("ada".into())).unwrap();
        assert_eq!(frame, r#"42["setUsername","ada"]"#);

        let frame = encode_outbound(&OutboundEvent::Typing(false)).unwrap();
        assert_eq!(frame, r#"42["typing",false]"#);

        let frame = encode_outbound(&OutboundEvent::ClearChat).unwrap();
        assert_eq!(frame, r#"42["clearChat"]"#);
    }
}
