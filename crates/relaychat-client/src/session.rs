//! Engine.IO / Socket.IO session state machine.
//!
//! One [`RelaySession`] lives for one WebSocket connection. The transport
//! builds a fresh session on every reconnect, so no state survives a dropped
//! socket except what the relay resends.
//!
//! # State transitions
//!
//! ```text
//! Disconnected ──Opened──▶ AwaitingOpen ──"0{..}"──▶ Joining ──"40{sid}"──▶ Connected
//!       ▲                        │                      │                      │
//!       └──── Closed / "1" / "44" / "41" / heartbeat timeout ◀─────────────────┘
//! ```

use std::{ops::Add, time::Duration};

use relaychat_proto::{
    ConnectionId, EnginePacket, InboundEvent, OutboundEvent, SocketPacket, SocketPacketKind,
};
use tracing::{debug, warn};

use crate::{
    error::SessionError,
    event::{SessionAction, SessionEvent},
};

/// How long the relay may take to send its open handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No WebSocket.
    Disconnected,
    /// WebSocket open, waiting for the Engine.IO handshake.
    AwaitingOpen,
    /// Namespace connect sent, waiting for confirmation.
    Joining {
        /// Silence tolerated before the relay is considered gone.
        liveness: Duration,
    },
    /// Namespace confirmed. Events flow both ways.
    Connected {
        /// Id the relay assigned to this connection.
        connection_id: ConnectionId,
        /// Silence tolerated before the relay is considered gone.
        liveness: Duration,
    },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingOpen => "awaiting open",
            Self::Joining { .. } => "joining",
            Self::Connected { .. } => "connected",
        }
    }
}

/// Sans-IO relay session.
#[derive(Debug)]
pub struct RelaySession<I> {
    namespace: String,
    state: SessionState,
    last_heard: Option<I>,
}

impl<I> RelaySession<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a disconnected session for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), state: SessionState::Disconnected, last_heard: None }
    }

    /// Current phase.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Id of the current connection, once confirmed.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        match &self.state {
            SessionState::Connected { connection_id, .. } => Some(connection_id),
            _ => None,
        }
    }

    /// Whether events can be emitted.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Time after which a silent relay is treated as gone.
    pub fn liveness_deadline(&self) -> Option<I> {
        let last = self.last_heard?;
        match &self.state {
            SessionState::Disconnected => None,
            SessionState::AwaitingOpen => Some(last + HANDSHAKE_TIMEOUT),
            SessionState::Joining { liveness } | SessionState::Connected { liveness, .. } => {
                Some(last + *liveness)
            },
        }
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for frames that cannot be decoded or arrive
    /// out of order. The phase is unchanged in that case, but any frame that
    /// carries a valid Engine.IO type still counts as hearing from the relay
    /// and pushes the liveness deadline back.
    pub fn handle(
        &mut self,
        event: SessionEvent<I>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Opened { now } => {
                self.state = SessionState::AwaitingOpen;
                self.last_heard = Some(now);
                Ok(vec![])
            },
            SessionEvent::TextReceived { text, now } => self.handle_text(&text, now),
            SessionEvent::Closed => {
                self.state = SessionState::Disconnected;
                self.last_heard = None;
                Ok(vec![])
            },
            SessionEvent::Tick { now } => Ok(self.check_liveness(now)),
            SessionEvent::Emit(event) => self.handle_emit(&event),
        }
    }

    fn handle_text(&mut self, text: &str, now: I) -> Result<Vec<SessionAction>, SessionError> {
        let packet = EnginePacket::decode(text)?;
        self.last_heard = Some(now);

        match packet {
            EnginePacket::Open(handshake) => {
                if self.state != SessionState::AwaitingOpen {
                    return Err(self.unexpected("open"));
                }
                debug!(sid = %handshake.sid, ping_interval_ms = handshake.ping_interval_ms, "relay handshake");

                self.state = SessionState::Joining { liveness: handshake.liveness_window() };
                let connect = SocketPacket::connect(&self.namespace).encode();
                Ok(vec![SessionAction::SendText(EnginePacket::Message(connect).encode()?)])
            },
            EnginePacket::Ping(data) => {
                Ok(vec![SessionAction::SendText(EnginePacket::Pong(data).encode()?)])
            },
            EnginePacket::Close => Ok(self.disconnect("relay closed the session")),
            EnginePacket::Message(inner) => self.handle_socket_packet(&inner),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(vec![]),
        }
    }

    fn handle_socket_packet(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        let packet = SocketPacket::decode(text)?;
        if packet.namespace != self.namespace {
            debug!(namespace = %packet.namespace, "ignoring packet for other namespace");
            return Ok(vec![]);
        }

        match packet.kind {
            SocketPacketKind::Connect => {
                let SessionState::Joining { liveness } = self.state else {
                    return Err(self.unexpected("connect"));
                };
                let connection_id =
                    packet.connection_id().ok_or(SessionError::MissingConnectionId)?;

                debug!(%connection_id, "namespace connected");
                self.state =
                    SessionState::Connected { connection_id: connection_id.clone(), liveness };
                Ok(vec![SessionAction::Deliver(InboundEvent::Connect { connection_id })])
            },
            SocketPacketKind::ConnectError => {
                let message = packet.error_message().unwrap_or_else(|| "no reason given".into());
                Ok(self.disconnect(&format!("relay refused connection: {message}")))
            },
            SocketPacketKind::Disconnect => Ok(self.disconnect("relay closed the namespace")),
            SocketPacketKind::Event => {
                if !self.is_connected() {
                    return Err(self.unexpected("event"));
                }
                match InboundEvent::from_event_args(packet.into_event_args()?)? {
                    Some(event) => Ok(vec![SessionAction::Deliver(event)]),
                    None => {
                        debug!("ignoring unknown relay event");
                        Ok(vec![])
                    },
                }
            },
            SocketPacketKind::Ack => Ok(vec![]),
        }
    }

    fn handle_emit(&self, event: &OutboundEvent) -> Result<Vec<SessionAction>, SessionError> {
        if !self.is_connected() {
            warn!(event = event.name(), state = self.state.name(), "dropping emit while not connected");
            return Ok(vec![]);
        }

        let packet = SocketPacket::event(&self.namespace, event.to_args()).encode();
        Ok(vec![SessionAction::SendText(EnginePacket::Message(packet).encode()?)])
    }

    fn check_liveness(&mut self, now: I) -> Vec<SessionAction> {
        match self.liveness_deadline() {
            Some(deadline) if now > deadline => self.disconnect("relay heartbeat timed out"),
            _ => vec![],
        }
    }

    fn disconnect(&mut self, reason: &str) -> Vec<SessionAction> {
        self.state = SessionState::Disconnected;
        self.last_heard = None;
        vec![SessionAction::Reconnect { reason: reason.to_string() }]
    }

    fn unexpected(&self, packet: &'static str) -> SessionError {
        SessionError::UnexpectedPacket { packet, state: self.state.name() }
    }
}

#[cfg(test)]
mod tests {
    use relaychat_proto::{ChatMessage, DEFAULT_NAMESPACE};

    use super::*;

    const OPEN: &str = r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    fn at(secs: u64) -> Duration {
        Duration::from_secs(secs)
    }

    fn text(session: &mut RelaySession<Duration>, frame: &str, now: u64) -> Vec<SessionAction> {
        session
            .handle(SessionEvent::TextReceived { text: frame.to_string(), now: at(now) })
            .unwrap()
    }

    fn connected_session() -> RelaySession<Duration> {
        let mut session = RelaySession::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();
        text(&mut session, OPEN, 0);
        text(&mut session, r#"40{"sid":"c1"}"#, 0);
        session
    }

    #[test]
    fn handshake_sends_namespace_connect() {
        let mut session = RelaySession::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();

        let actions = text(&mut session, OPEN, 0);

        assert_eq!(actions, vec![SessionAction::SendText("40".into())]);
        assert!(matches!(session.state(), SessionState::Joining { .. }));
    }

    #[test]
    fn connect_confirmation_delivers_connection_id() {
        let mut session = RelaySession::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();
        text(&mut session, OPEN, 0);

        let actions = text(&mut session, r#"40{"sid":"c1"}"#, 0);

        assert_eq!(
            actions,
            vec![SessionAction::Deliver(InboundEvent::Connect {
                connection_id: ConnectionId::new("c1")
            })]
        );
        assert_eq!(session.connection_id(), Some(&ConnectionId::new("c1")));
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let mut session = connected_session();
        assert_eq!(text(&mut session, "2", 1), vec![SessionAction::SendText("3".into())]);
    }

    #[test]
    fn events_are_delivered_once_connected() {
        let mut session = connected_session();

        let actions = text(
            &mut session,
            r#"42["messageFromServerToClient",{"id":"server","text":"ada joined"}]"#,
            1,
        );

        assert_eq!(
            actions,
            vec![SessionAction::Deliver(InboundEvent::MessageFromServerToClient(
                ChatMessage::system("ada joined")
            ))]
        );
    }

    #[test]
    fn event_before_connect_is_rejected() {
        let mut session = RelaySession::<Duration>::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();
        text(&mut session, OPEN, 0);

        let result = session.handle(SessionEvent::TextReceived {
            text: r#"42["activeUsers",[]]"#.into(),
            now: at(0),
        });

        assert!(matches!(result, Err(SessionError::UnexpectedPacket { packet: "event", .. })));
    }

    #[test]
    fn unknown_event_is_ignored() {
        let mut session = connected_session();
        assert!(text(&mut session, r#"42["somethingElse",1]"#, 1).is_empty());
    }

    #[test]
    fn malformed_frame_leaves_session_connected() {
        let mut session = connected_session();

        let result = session
            .handle(SessionEvent::TextReceived { text: "42[not json".into(), now: at(1) });

        assert!(matches!(result, Err(SessionError::Protocol(_))));
        assert!(session.is_connected());
    }

    #[test]
    fn malformed_message_still_extends_liveness() {
        let mut session = connected_session();

        let result = session
            .handle(SessionEvent::TextReceived { text: "42[not json".into(), now: at(30) });

        assert!(result.is_err());
        assert_eq!(session.liveness_deadline(), Some(at(75)));
    }

    #[test]
    fn unknown_engine_type_does_not_extend_liveness() {
        let mut session = connected_session();

        let result =
            session.handle(SessionEvent::TextReceived { text: "9".into(), now: at(30) });

        assert!(result.is_err());
        assert_eq!(session.liveness_deadline(), Some(at(45)));
    }

    #[test]
    fn emit_while_connected_writes_event_frame() {
        let mut session = connected_session();

        let actions = session.handle(SessionEvent::Emit(OutboundEvent::Typing(true))).unwrap();

        assert_eq!(actions, vec![SessionAction::SendText(r#"42["typing",true]"#.into())]);
    }

    #[test]
    fn emit_while_joining_is_dropped() {
        let mut session = RelaySession::<Duration>::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();

        let actions = session.handle(SessionEvent::Emit(OutboundEvent::ClearChat)).unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn connect_error_requests_reconnect() {
        let mut session = RelaySession::<Duration>::new(DEFAULT_NAMESPACE);
        session.handle(SessionEvent::Opened { now: at(0) }).unwrap();
        text(&mut session, OPEN, 0);

        let actions = text(&mut session, r#"44{"message":"Not authorized"}"#, 0);

        assert_eq!(
            actions,
            vec![SessionAction::Reconnect {
                reason: "relay refused connection: Not authorized".into()
            }]
        );
        assert_eq!(session.state(), &SessionState::Disconnected);
    }

    #[test]
    fn heartbeat_timeout_requests_reconnect() {
        let mut session = connected_session();

        // 25s interval + 20s timeout
        assert!(session.handle(SessionEvent::Tick { now: at(45) }).unwrap().is_empty());
        let actions = session.handle(SessionEvent::Tick { now: at(46) }).unwrap();

        assert!(matches!(actions.as_slice(), [SessionAction::Reconnect { .. }]));
        assert!(!session.is_connected());
    }

    #[test]
    fn ping_extends_liveness() {
        let mut session = connected_session();
        text(&mut session, "2", 30);

        assert_eq!(session.liveness_deadline(), Some(at(75)));
        assert!(session.handle(SessionEvent::Tick { now: at(60) }).unwrap().is_empty());
    }

    #[test]
    fn other_namespace_is_ignored() {
        let mut session = connected_session();
        assert!(text(&mut session, r#"42/admin,["activeUsers",["x"]]"#, 1).is_empty());
    }

    #[test]
    fn engine_close_requests_reconnect() {
        let mut session = connected_session();
        assert!(matches!(text(&mut session, "1", 1).as_slice(), [SessionAction::Reconnect { .. }]));
    }
}
