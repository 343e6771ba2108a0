//! Observable chat state.
//!
//! These containers are the view model: each owns one slice of what the
//! relay has told us, plus the local identity. All of them are replaced or
//! extended only through their mutation methods, called by [`crate::App`].

use relaychat_proto::{ChatMessage, ConnectionId, TypingUpdate};

/// Whether the user has picked a username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Join form is showing.
    #[default]
    Unestablished,
    /// Username submitted. Chat is usable.
    Established,
}

/// Local identity.
///
/// The connection id follows the relay: it is replaced on every `connect`.
/// The username is set once and never changes afterwards, reconnect
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    connection_id: Option<ConnectionId>,
    username: String,
    phase: SessionPhase,
}

impl Identity {
    /// Fresh, unestablished identity with no connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the current relay connection.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_id.as_ref()
    }

    /// Chosen username. Empty until established.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether chat actions are allowed.
    pub fn is_established(&self) -> bool {
        self.phase == SessionPhase::Established
    }

    /// Adopt the id of a new relay connection.
    pub fn set_connection_id(&mut self, connection_id: ConnectionId) {
        self.connection_id = Some(connection_id);
    }

    /// Fix the username and move to [`SessionPhase::Established`].
    ///
    /// Returns `false` without changes if already established or if
    /// `username` is blank.
    pub fn establish(&mut self, username: String) -> bool {
        if self.is_established() || username.trim().is_empty() {
            return false;
        }
        self.username = username;
        self.phase = SessionPhase::Established;
        true
    }
}

/// How a message relates to the local user. Derived at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Sent from the current connection.
    Mine,
    /// Relay notice.
    System,
    /// Sent by someone else.
    Other,
}

impl Ownership {
    /// Classify `message` against the current connection id.
    ///
    /// Messages sent before a reconnect carry the old id and show up as
    /// [`Ownership::Other`].
    pub fn of(message: &ChatMessage, connection_id: Option<&ConnectionId>) -> Self {
        if message.is_system() {
            Self::System
        } else if connection_id.is_some_and(|id| id.as_str() == message.sender_id) {
            Self::Mine
        } else {
            Self::Other
        }
    }
}

/// Ordered conversation log.
///
/// Insertion order is display order. The log is seeded wholesale by each
/// history snapshot and otherwise only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log.
    pub fn seed_history(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Append one message.
    pub fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Every stored message, hidden ones included.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages that are rendered, in order.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|message| is_visible(message))
    }

    /// Number of rendered messages.
    pub fn visible_len(&self) -> usize {
        self.visible().count()
    }
}

/// Departure notices from the relay are kept in the log but not shown.
pub fn is_visible(message: &ChatMessage) -> bool {
    !(message.is_system() && message.text.contains("left"))
}

/// Usernames the relay reports as online, in relay order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    users: Vec<String>,
}

impl Presence {
    /// Replace the whole list.
    pub fn replace(&mut self, users: Vec<String>) {
        self.users = users;
    }

    /// Online usernames.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Nobody online.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Single-slot typing indicator. Last update wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingIndicator {
    typer: Option<String>,
}

impl TypingIndicator {
    /// Show `username` if they started typing, otherwise clear the slot.
    pub fn apply(&mut self, update: TypingUpdate) {
        self.typer = update.typing.then_some(update.username);
    }

    /// Who is typing, if anyone.
    pub fn typer(&self) -> Option<&str> {
        self.typer.as_deref()
    }
}

/// Action waiting for a yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmation {
    /// Wipe the conversation for every participant.
    ClearChat,
}

impl PendingConfirmation {
    /// Question shown to the user.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::ClearChat => "Clear chat for all users? (y/n)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_does_not_establish() {
        let mut identity = Identity::new();

        assert!(!identity.establish("   ".into()));
        assert!(!identity.establish(String::new()));
        assert_eq!(identity.phase(), SessionPhase::Unestablished);
    }

    #[test]
    fn username_is_fixed_after_establishment() {
        let mut identity = Identity::new();

        assert!(identity.establish(" ada ".into()));
        assert!(!identity.establish("bob".into()));
        assert_eq!(identity.username(), " ada ");
    }

    #[test]
    fn reconnect_keeps_establishment() {
        let mut identity = Identity::new();
        identity.set_connection_id(ConnectionId::new("c1"));
        identity.establish("ada".into());

        identity.set_connection_id(ConnectionId::new("c2"));

        assert!(identity.is_established());
        assert_eq!(identity.connection_id(), Some(&ConnectionId::new("c2")));
    }

    #[test]
    fn ownership_follows_current_connection() {
        let mine = ChatMessage::user("c1", "ada", "hi");
        let notice = ChatMessage::system("ada joined");

        assert_eq!(Ownership::of(&mine, Some(&ConnectionId::new("c1"))), Ownership::Mine);
        assert_eq!(Ownership::of(&mine, Some(&ConnectionId::new("c2"))), Ownership::Other);
        assert_eq!(Ownership::of(&mine, None), Ownership::Other);
        assert_eq!(Ownership::of(&notice, Some(&ConnectionId::new("c1"))), Ownership::System);
    }

    #[test]
    fn departure_notices_are_hidden_but_stored() {
        let mut conversation = Conversation::new();
        conversation.seed_history(vec![
            ChatMessage::system("ada joined the chat"),
            ChatMessage::system("bob left the chat"),
            ChatMessage::user("c1", "ada", "I left my keys"),
        ]);

        assert_eq!(conversation.messages().len(), 3);
        let visible: Vec<_> = conversation.visible().map(|m| m.text.as_str()).collect();
        assert_eq!(visible, ["ada joined the chat", "I left my keys"]);
    }

    #[test]
    fn history_replaces_log() {
        let mut conversation = Conversation::new();
        conversation.append_message(ChatMessage::system("old"));

        conversation.seed_history(vec![ChatMessage::system("new")]);

        assert_eq!(conversation.messages(), &[ChatMessage::system("new")]);
    }

    #[test]
    fn typing_indicator_last_writer_wins() {
        let mut typing = TypingIndicator::default();
        let update = |username: &str, typing| TypingUpdate { username: username.into(), typing };

        typing.apply(update("A", true));
        assert_eq!(typing.typer(), Some("A"));
        typing.apply(update("B", true));
        assert_eq!(typing.typer(), Some("B"));
        typing.apply(update("A", false));
        assert_eq!(typing.typer(), None);
    }

    #[test]
    fn anonymous_stop_update_clears_indicator() {
        let mut typing = TypingIndicator::default();
        typing.apply(TypingUpdate { username: "bob".into(), typing: true });

        typing.apply(TypingUpdate { username: String::new(), typing: false });

        assert_eq!(typing.typer(), None);
    }
}
