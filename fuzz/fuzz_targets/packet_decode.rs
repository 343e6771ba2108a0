//! Fuzz target for relay packet decoding
//!
//! Feeds arbitrary text through every decoding layer a relay frame passes
//! through: Engine.IO packet, Socket.IO packet, then event arguments.
//!
//! The decoder should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relaychat_proto::{EnginePacket, InboundEvent, SocketPacket, SocketPacketKind};

fuzz_target!(|text: &str| {
    let Ok(EnginePacket::Message(inner)) = EnginePacket::decode(text) else {
        return;
    };
    let Ok(packet) = SocketPacket::decode(&inner) else {
        return;
    };

    let _ = packet.connection_id();
    let _ = packet.error_message();

    if packet.kind == SocketPacketKind::Event {
        if let Ok(args) = packet.into_event_args() {
            let _ = InboundEvent::from_event_args(args);
        }
    }
});
