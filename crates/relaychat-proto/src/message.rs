//! Chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sender id the relay uses for its own announcements (join, leave, clear).
pub const SYSTEM_SENDER_ID: &str = "server";

/// A single entry of the conversation log, as supplied by the relay.
///
/// Relay messages are trusted verbatim: missing or `null` `text` decodes as
/// empty and an unparsable `time` decodes as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Connection id of the author, or [`SYSTEM_SENDER_ID`].
    #[serde(rename = "id")]
    pub sender_id: String,
    /// Display name of the author. `None` for system messages.
    #[serde(rename = "username", default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    /// Message body.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Relay-side send time. `None` if the relay omitted it.
    #[serde(
        rename = "time",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize"
    )]
    pub sent_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Message authored by a user connection.
    pub fn user(
        sender_id: impl Into<String>,
        username: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_username: Some(username.into()),
            text: text.into(),
            sent_at: None,
        }
    }

    /// Announcement authored by the relay itself.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_username: None,
            text: text.into(),
            sent_at: None,
        }
    }

    /// Attach a send time.
    #[must_use]
    pub fn with_sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    /// Whether the relay authored this message.
    pub fn is_system(&self) -> bool {
        self.sender_id == SYSTEM_SENDER_ID
    }
}

/// Decode `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lenient `time` decoding: RFC 3339 strings or epoch milliseconds.
mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        FractionalMillis(f64),
        Text(String),
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
            Some(Raw::FractionalMillis(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
            Some(Raw::Text(text)) => {
                DateTime::parse_from_rfc3339(&text).ok().map(|t| t.with_timezone(&Utc))
            },
        };
        Ok(parsed)
    }
}
