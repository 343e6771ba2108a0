//! Property-based tests for the relay session state machine.
//!
//! Feeds arbitrary interleavings of frames, ticks, emits and closes and
//! checks the session never writes an event frame or delivers an event
//! outside a confirmed connection.

use std::time::Duration;

use proptest::prelude::*;
use relaychat_client::{
    InboundEvent, OutboundEvent, RelaySession, SessionAction, SessionEvent, SessionState,
};
use relaychat_proto::DEFAULT_NAMESPACE;

const FRAMES: &[&str] = &[
    r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#,
    r#"40{"sid":"c1"}"#,
    r#"40{"sid":"c2"}"#,
    "40",
    r#"44{"message":"nope"}"#,
    "41",
    "1",
    "2",
    "3",
    "6",
    r#"42["activeUsers",["ada","bob"]]"#,
    r#"42["userTyping",{"username":"bob","typing":true}]"#,
    r#"42["errorMessage","Username already taken"]"#,
    r#"42["chatHistory",[]]"#,
    r#"42["unknown",1]"#,
    "42[broken",
];

#[derive(Debug, Clone)]
enum Step {
    Open,
    Frame(String),
    Tick(u64),
    Emit(bool),
    Close,
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(Step::Open),
        6 => prop::sample::select(FRAMES).prop_map(|f| Step::Frame(f.to_string())),
        1 => ".{0,12}".prop_map(Step::Frame),
        2 => (0u64..60).prop_map(Step::Tick),
        2 => any::<bool>().prop_map(Step::Emit),
        1 => Just(Step::Close),
    ]
}

proptest! {
    #[test]
    fn prop_events_only_flow_while_connected(steps in prop::collection::vec(arbitrary_step(), 1..60)) {
        let mut session = RelaySession::<Duration>::new(DEFAULT_NAMESPACE);
        let mut now = Duration::ZERO;

        for step in steps {
            let was_connected = session.is_connected();
            let event = match step {
                Step::Open => SessionEvent::Opened { now },
                Step::Frame(text) => SessionEvent::TextReceived { text, now },
                Step::Tick(secs) => {
                    now += Duration::from_secs(secs);
                    SessionEvent::Tick { now }
                },
                Step::Emit(typing) => SessionEvent::Emit(OutboundEvent::Typing(typing)),
                Step::Close => SessionEvent::Closed,
            };
            let is_emit = matches!(event, SessionEvent::Emit(_));

            let Ok(actions) = session.handle(event) else { continue };

            for action in &actions {
                match action {
                    // PROPERTY: event frames are written only while connected
                    SessionAction::SendText(text) if text.starts_with("42") => {
                        prop_assert!(is_emit && was_connected);
                    },
                    // PROPERTY: relay events reach subscribers only after connect
                    SessionAction::Deliver(InboundEvent::Connect { .. }) => {
                        prop_assert!(session.is_connected());
                    },
                    SessionAction::Deliver(_) => prop_assert!(was_connected),
                    _ => {},
                }
            }

            // PROPERTY: connection id is known exactly while connected
            prop_assert_eq!(
                session.connection_id().is_some(),
                matches!(session.state(), SessionState::Connected { .. })
            );
        }
    }

    #[test]
    fn prop_emit_after_connect_round_trips(text in ".*") {
        let mut session = RelaySession::<Duration>::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: Duration::ZERO }).unwrap();
        session.handle(SessionEvent::TextReceived { text: FRAMES[0].into(), now: Duration::ZERO }).unwrap();
        session.handle(SessionEvent::TextReceived { text: FRAMES[1].into(), now: Duration::ZERO }).unwrap();

        let event = OutboundEvent::MessageFromClientToServer(text);
        let actions = session.handle(SessionEvent::Emit(event.clone())).unwrap();

        prop_assert_eq!(actions, vec![SessionAction::SendText(
            relaychat_proto::encode_outbound(&event).unwrap()
        )]);
    }
}
