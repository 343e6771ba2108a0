//! Fuzz target for the relay session state machine
//!
//! # Strategy
//!
//! - Frames: well-formed handshake, connect, ping, event and close frames
//!   mixed with arbitrary text
//! - Time: ticks that advance virtual time by arbitrary amounts
//! - Emits: arbitrary outbound events in every state
//!
//! # Invariants
//!
//! - Events are delivered only while connected
//! - A connection id is known exactly while connected
//! - Event frames are written only while connected
//! - A reconnect request always leaves the session disconnected

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relaychat_client::{RelaySession, SessionAction, SessionEvent, SessionState};
use relaychat_proto::{DEFAULT_NAMESPACE, OutboundEvent};

const OPEN: &str =
    r#"0{"sid":"s","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Opened,
    Frame(FrameChoice),
    Tick { millis: u16 },
    Emit(EmitChoice),
    Closed,
}

#[derive(Debug, Clone, Arbitrary)]
enum FrameChoice {
    Open,
    Connect,
    Ping,
    Message,
    ConnectError,
    Disconnect,
    EngineClose,
    Raw(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum EmitChoice {
    SetUsername(String),
    Message(String),
    Typing(bool),
    ClearChat,
}

fn frame_text(choice: FrameChoice) -> String {
    match choice {
        FrameChoice::Open => OPEN.to_string(),
        FrameChoice::Connect => r#"40{"sid":"c"}"#.to_string(),
        FrameChoice::Ping => "2".to_string(),
        FrameChoice::Message => r#"42["errorMessage","x"]"#.to_string(),
        FrameChoice::ConnectError => r#"44{"message":"no"}"#.to_string(),
        FrameChoice::Disconnect => "41".to_string(),
        FrameChoice::EngineClose => "1".to_string(),
        FrameChoice::Raw(text) => text,
    }
}

fn outbound(choice: EmitChoice) -> OutboundEvent {
    match choice {
        EmitChoice::SetUsername(name) => OutboundEvent::SetUsername(name),
        EmitChoice::Message(text) => OutboundEvent::MessageFromClientToServer(text),
        EmitChoice::Typing(typing) => OutboundEvent::Typing(typing),
        EmitChoice::ClearChat => OutboundEvent::ClearChat,
    }
}

fuzz_target!(|ops: Vec<SessionOp>| {
    let mut session: RelaySession<Duration> = RelaySession::new(DEFAULT_NAMESPACE);
    let mut now = Duration::ZERO;

    for op in ops {
        let connected_before = session.is_connected();
        let event = match op {
            SessionOp::Opened => SessionEvent::Opened { now },
            SessionOp::Frame(choice) => SessionEvent::TextReceived { text: frame_text(choice), now },
            SessionOp::Tick { millis } => {
                now += Duration::from_millis(u64::from(millis) * 100);
                SessionEvent::Tick { now }
            },
            SessionOp::Emit(choice) => SessionEvent::Emit(outbound(choice)),
            SessionOp::Closed => SessionEvent::Closed,
        };

        // Errors are logged and skipped by the transport
        let Ok(actions) = session.handle(event) else {
            continue;
        };

        for action in actions {
            match action {
                SessionAction::Deliver(_) => {
                    assert!(session.is_connected(), "delivered while not connected");
                },
                SessionAction::SendText(text) => {
                    if text.starts_with("42") {
                        assert!(connected_before, "event frame written while not connected");
                    }
                },
                SessionAction::Reconnect { .. } => {
                    assert_eq!(session.state(), &SessionState::Disconnected);
                },
            }
        }

        assert_eq!(session.connection_id().is_some(), session.is_connected());
    }
});
