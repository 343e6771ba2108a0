//! Named events exchanged with the relay.
//!
//! On the wire an event is a JSON array whose first element is the event name
//! and whose remaining elements are the arguments. Every relay event carries at
//! most one argument.

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{ChatMessage, ProtocolError, Result, message::null_as_default};

/// Relay-assigned identifier of one connection.
///
/// A fresh id is issued on every (re)connect, so it identifies a connection
/// epoch rather than a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wrap a relay session id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names of inbound events a caller can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// Namespace connection established (new connection id).
    Connect,
    /// Full conversation snapshot.
    ChatHistory,
    /// One new conversation entry.
    MessageFromServerToClient,
    /// Relay-reported error text.
    ErrorMessage,
    /// Full presence list.
    ActiveUsers,
    /// Typing indicator change.
    UserTyping,
}

impl EventName {
    /// All inbound event names.
    pub const ALL: [EventName; 6] = [
        EventName::Connect,
        EventName::ChatHistory,
        EventName::MessageFromServerToClient,
        EventName::ErrorMessage,
        EventName::ActiveUsers,
        EventName::UserTyping,
    ];

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::ChatHistory => "chatHistory",
            Self::MessageFromServerToClient => "messageFromServerToClient",
            Self::ErrorMessage => "errorMessage",
            Self::ActiveUsers => "activeUsers",
            Self::UserTyping => "userTyping",
        }
    }

    /// Look up an event by wire name. `None` for names this client ignores.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `userTyping`.
///
/// Missing or `null` fields decode as empty / `false`, so a malformed stop
/// update still clears the indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingUpdate {
    /// User whose typing state changed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Whether that user currently has text in their composer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub typing: bool,
}

/// Events received from the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Connected (or reconnected) to the relay namespace.
    Connect {
        /// Id assigned to this connection.
        connection_id: ConnectionId,
    },
    /// Replace the conversation log.
    ChatHistory(Vec<ChatMessage>),
    /// Append to the conversation log.
    MessageFromServerToClient(ChatMessage),
    /// Show a transient error notice.
    ErrorMessage(String),
    /// Replace the presence list.
    ActiveUsers(Vec<String>),
    /// Update the typing indicator.
    UserTyping(TypingUpdate),
}

impl InboundEvent {
    /// Name used for subscription routing.
    pub fn name(&self) -> EventName {
        match self {
            Self::Connect { .. } => EventName::Connect,
            Self::ChatHistory(_) => EventName::ChatHistory,
            Self::MessageFromServerToClient(_) => EventName::MessageFromServerToClient,
            Self::ErrorMessage(_) => EventName::ErrorMessage,
            Self::ActiveUsers(_) => EventName::ActiveUsers,
            Self::UserTyping(_) => EventName::UserTyping,
        }
    }

    /// Decode the arguments of an EVENT packet.
    ///
    /// Returns `Ok(None)` for event names this client does not consume.
    /// `connect` never arrives as an EVENT packet, so it is also ignored here.
    pub fn from_event_args(args: Vec<Value>) -> Result<Option<Self>> {
        let (name, payload) = split_event(args)?;

        let event = match EventName::from_wire(&name) {
            None | Some(EventName::Connect) => return Ok(None),
            Some(EventName::ChatHistory) => Self::ChatHistory(decode_payload(&name, payload)?),
            Some(EventName::MessageFromServerToClient) => {
                Self::MessageFromServerToClient(decode_payload(&name, payload)?)
            },
            Some(EventName::ErrorMessage) => Self::ErrorMessage(decode_payload(&name, payload)?),
            Some(EventName::ActiveUsers) => Self::ActiveUsers(decode_payload(&name, payload)?),
            Some(EventName::UserTyping) => Self::UserTyping(decode_payload(&name, payload)?),
        };

        Ok(Some(event))
    }

    /// Encode as EVENT packet arguments, the way the relay sends them.
    ///
    /// `None` for [`InboundEvent::Connect`], which is a CONNECT packet.
    pub fn to_args(&self) -> Result<Option<Vec<Value>>> {
        let payload = match self {
            Self::Connect { .. } => return Ok(None),
            Self::ChatHistory(history) => serde_json::to_value(history)?,
            Self::MessageFromServerToClient(message) => serde_json::to_value(message)?,
            Self::ErrorMessage(text) => Value::String(text.clone()),
            Self::ActiveUsers(users) => serde_json::to_value(users)?,
            Self::UserTyping(update) => serde_json::to_value(update)?,
        };
        Ok(Some(vec![Value::String(self.name().as_str().to_string()), payload]))
    }
}

/// Events emitted to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Claim a display name for this session.
    SetUsername(String),
    /// Post a chat message.
    MessageFromClientToServer(String),
    /// Report whether the composer currently holds text.
    Typing(bool),
    /// Clear the conversation for every participant.
    ClearChat,
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetUsername(_) => "setUsername",
            Self::MessageFromClientToServer(_) => "messageFromClientToServer",
            Self::Typing(_) => "typing",
            Self::ClearChat => "clearChat",
        }
    }

    /// Encode as EVENT packet arguments.
    pub fn to_args(&self) -> Vec<Value> {
        let name = Value::String(self.name().to_string());
        match self {
            Self::SetUsername(text) | Self::MessageFromClientToServer(text) => {
                vec![name, Value::String(text.clone())]
            },
            Self::Typing(typing) => vec![name, Value::Bool(*typing)],
            Self::ClearChat => vec![name],
        }
    }

    /// Decode EVENT packet arguments sent by a client.
    ///
    /// Relay-side counterpart of [`OutboundEvent::to_args`]; used by simulated
    /// relays. `Ok(None)` for unknown names.
    pub fn from_event_args(args: Vec<Value>) -> Result<Option<Self>> {
        let (name, payload) = split_event(args)?;

        let event = match name.as_str() {
            "setUsername" => Self::SetUsername(decode_payload(&name, payload)?),
            "messageFromClientToServer" => {
                Self::MessageFromClientToServer(decode_payload(&name, payload)?)
            },
            "typing" => Self::Typing(decode_payload(&name, payload)?),
            "clearChat" => Self::ClearChat,
            _ => return Ok(None),
        };

        Ok(Some(event))
    }
}

/// Split `["name", payload?]` into its parts.
fn split_event(args: Vec<Value>) -> Result<(String, Option<Value>)> {
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(ProtocolError::InvalidEvent(format!("event name is not a string: {other}")));
        },
        None => return Err(ProtocolError::InvalidEvent("empty event array".to_string())),
    };

    Ok((name, args.next()))
}

fn decode_payload<T: DeserializeOwned>(name: &str, payload: Option<Value>) -> Result<T> {
    let payload =
        payload.ok_or_else(|| ProtocolError::InvalidEvent(format!("{name}: missing payload")))?;
    Ok(serde_json::from_value(payload)?)
}
