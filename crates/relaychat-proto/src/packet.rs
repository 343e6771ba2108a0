//! Engine.IO and Socket.IO text packet framing.
//!
//! Two nested layers share one WebSocket text frame:
//!
//! ```text
//! 4 2 ["messageFromServerToClient",{...}]
//! │ │ └─ Socket.IO data (JSON)
//! │ └─── Socket.IO packet type (EVENT)
//! └───── Engine.IO packet type (MESSAGE)
//! ```
//!
//! # Invariants
//!
//! - Every packet starts with exactly one ASCII type digit.
//! - Namespaces other than [`DEFAULT_NAMESPACE`] are followed by `,` when
//!   encoded. The default namespace is never written out.
//! - Encoding then decoding a [`SocketPacket`] yields an equal packet.

use std::{fmt::Write as _, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConnectionId, ProtocolError, Result};

/// Namespace used when a packet does not name one.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Engine.IO open handshake, sent by the relay as the first packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id. Not the Socket.IO connection id.
    pub sid: String,
    /// Transports the relay is willing to upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between relay pings, in milliseconds.
    #[serde(rename = "pingInterval")]
    pub ping_interval_ms: u64,
    /// Grace period after a missed ping, in milliseconds.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,
    /// Largest payload the relay accepts, in bytes.
    #[serde(default)]
    pub max_payload: u64,
}

impl Handshake {
    /// How long the connection may stay silent before it is considered dead.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms.saturating_add(self.ping_timeout_ms))
    }
}

/// Transport-level packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session opened (`0`).
    Open(Handshake),
    /// Session closed (`1`).
    Close,
    /// Heartbeat from the relay (`2`), optionally carrying probe data.
    Ping(String),
    /// Heartbeat reply (`3`).
    Pong(String),
    /// Socket.IO payload (`4`).
    Message(String),
    /// Transport upgrade (`5`).
    Upgrade,
    /// No-op (`6`).
    Noop,
}

impl EnginePacket {
    /// Decode one Engine.IO text packet.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let data = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(data)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(data.to_string())),
            '3' => Ok(Self::Pong(data.to_string())),
            '4' => Ok(Self::Message(data.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            found => Err(ProtocolError::UnknownPacketType { layer: "engine", found }),
        }
    }

    /// Encode as a WebSocket text frame.
    pub fn encode(&self) -> Result<String> {
        let text = match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        };
        Ok(text)
    }
}

/// Socket.IO packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    /// Namespace connect request (client) or confirmation (relay).
    Connect,
    /// Namespace disconnect.
    Disconnect,
    /// Named event.
    Event,
    /// Acknowledgement of an event.
    Ack,
    /// Namespace connect refused.
    ConnectError,
}

impl SocketPacketKind {
    fn from_char(c: char) -> Result<Self> {
        match c {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' => Ok(Self::Event),
            '3' => Ok(Self::Ack),
            '4' => Ok(Self::ConnectError),
            '5' | '6' => Err(ProtocolError::UnsupportedBinary),
            found => Err(ProtocolError::UnknownPacketType { layer: "socket", found }),
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
        }
    }
}

/// Namespace-level packet carried inside [`EnginePacket::Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPacket {
    /// Packet type.
    pub kind: SocketPacketKind,
    /// Target namespace, starting with `/`.
    pub namespace: String,
    /// Acknowledgement id, if the sender expects an ACK.
    pub ack_id: Option<u64>,
    /// JSON data. Events carry an array `["name", args...]`.
    pub data: Option<Value>,
}

impl SocketPacket {
    /// Namespace connect request.
    pub fn connect(namespace: &str) -> Self {
        Self {
            kind: SocketPacketKind::Connect,
            namespace: namespace.to_string(),
            ack_id: None,
            data: None,
        }
    }

    /// Event without acknowledgement.
    pub fn event(namespace: &str, args: Vec<Value>) -> Self {
        Self {
            kind: SocketPacketKind::Event,
            namespace: namespace.to_string(),
            ack_id: None,
            data: Some(Value::Array(args)),
        }
    }

    /// Decode the payload of an Engine.IO message packet.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = SocketPacketKind::from_char(chars.next().ok_or(ProtocolError::EmptyPacket)?)?;
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            let (namespace, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            namespace.to_string()
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack_id = if digits > 0 {
            let (id, tail) = rest.split_at(digits);
            rest = tail;
            let id = id
                .parse::<u64>()
                .map_err(|e| ProtocolError::InvalidEvent(format!("ack id {id}: {e}")))?;
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() { None } else { Some(serde_json::from_str(rest)?) };

        Ok(Self { kind, namespace, ack_id, data })
    }

    /// Encode as the payload of an Engine.IO message packet.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.as_char());

        if self.namespace != DEFAULT_NAMESPACE {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            let _ = write!(out, "{id}");
        }
        if let Some(data) = &self.data {
            let _ = write!(out, "{data}");
        }

        out
    }

    /// Event arguments, if this is an EVENT packet with array data.
    pub fn into_event_args(self) -> Result<Vec<Value>> {
        match (self.kind, self.data) {
            (SocketPacketKind::Event, Some(Value::Array(args))) => Ok(args),
            (SocketPacketKind::Event, other) => {
                Err(ProtocolError::InvalidEvent(format!("event data is not an array: {other:?}")))
            },
            (kind, _) => Err(ProtocolError::InvalidEvent(format!("not an event packet: {kind:?}"))),
        }
    }

    /// Connection id confirmed by a CONNECT packet from the relay.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        if self.kind != SocketPacketKind::Connect {
            return None;
        }
        self.data.as_ref()?.get("sid")?.as_str().map(ConnectionId::new)
    }

    /// Reason carried by a CONNECT_ERROR packet.
    pub fn error_message(&self) -> Option<String> {
        if self.kind != SocketPacketKind::ConnectError {
            return None;
        }
        match self.data.as_ref()? {
            Value::String(message) => Some(message.clone()),
            data => data.get("message")?.as_str().map(str::to_string),
        }
    }
}
