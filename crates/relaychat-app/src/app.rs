//! Application state machine.
//!
//! [`App`] owns every piece of chat state and is completely decoupled from
//! I/O. It consumes [`AppEvent`]s and produces [`AppAction`]s for the
//! runtime to execute.
//!
//! # Responsibilities
//!
//! - Applies relay events to identity, conversation, presence, typing and
//!   notice state.
//! - Turns key input into composer edits, submissions and commands.
//! - Gates outbound chat events on an established session.
//! - Tracks how far the user has scrolled back from the newest message.

use std::{ops::Add, time::Duration};

use relaychat_proto::{ChatMessage, InboundEvent, OutboundEvent};
use tracing::debug;

use crate::{
    AppAction, AppEvent, Command, Composer, Conversation, Identity, KeyInput, Notice, Ownership,
    PendingConfirmation, Presence, TypingIndicator,
};

/// Messages moved per `PageUp` / `PageDown`.
const PAGE_SIZE: usize = 10;

/// Application state machine.
#[derive(Debug, Clone)]
pub struct App<I> {
    identity: Identity,
    conversation: Conversation,
    presence: Presence,
    typing: TypingIndicator,
    notice: Notice<I>,
    composer: Composer,
    /// Question blocking other input until answered.
    confirmation: Option<PendingConfirmation>,
    /// Visible messages hidden below the viewport. 0 follows the tail.
    scroll_back: usize,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
}

impl<I> Default for App<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> App<I> {
    /// Unestablished app with empty state.
    pub fn new() -> Self {
        Self::with_notice(Notice::default())
    }

    /// Unestablished app using `notice` for error toasts.
    pub fn with_notice(notice: Notice<I>) -> Self {
        Self {
            identity: Identity::new(),
            conversation: Conversation::new(),
            presence: Presence::default(),
            typing: TypingIndicator::default(),
            notice,
            composer: Composer::new(),
            confirmation: None,
            scroll_back: 0,
            terminal_size: (80, 24),
        }
    }

    /// Local identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Stored conversation log.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Online users.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Typing indicator.
    pub fn typing(&self) -> &TypingIndicator {
        &self.typing
    }

    /// Error notice.
    pub fn notice(&self) -> &Notice<I> {
        &self.notice
    }

    /// Input line.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Question awaiting an answer, if any.
    pub fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.confirmation
    }

    /// Visible messages scrolled past. 0 means following the newest.
    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// How `message` relates to the current connection.
    pub fn ownership(&self, message: &ChatMessage) -> Ownership {
        Ownership::of(message, self.identity.connection_id())
    }

    /// Visible messages up to the scroll position, oldest first.
    pub fn scrolled_messages(&self) -> Vec<&ChatMessage> {
        let mut visible: Vec<_> = self.conversation.visible().collect();
        visible.truncate(visible.len().saturating_sub(self.scroll_back));
        visible
    }

    /// Submit the composer as the username.
    ///
    /// Blank input is ignored and leaves the composer as it is.
    pub fn submit_username(&mut self) -> Vec<AppAction> {
        if self.identity.is_established() || self.composer.text().trim().is_empty() {
            return vec![];
        }

        let username = self.composer.take();
        self.identity.establish(username.clone());
        vec![AppAction::Emit(OutboundEvent::SetUsername(username)), AppAction::Render]
    }

    /// Submit the composer as a chat message.
    ///
    /// Requires an established session and non-blank text; otherwise nothing
    /// happens. The message is not echoed locally; it comes back from the
    /// relay.
    pub fn submit_message(&mut self) -> Vec<AppAction> {
        if !self.identity.is_established() || self.composer.text().trim().is_empty() {
            return vec![];
        }

        let text = self.composer.take();
        vec![AppAction::Emit(OutboundEvent::MessageFromClientToServer(text)), AppAction::Render]
    }

    /// Ask for confirmation before clearing the conversation for everyone.
    pub fn request_clear(&mut self) -> Vec<AppAction> {
        if !self.identity.is_established() {
            return vec![];
        }
        self.confirmation = Some(PendingConfirmation::ClearChat);
        vec![AppAction::Render]
    }

    /// Answer yes to the pending clear. The log itself is only cleared when
    /// the relay sends new history.
    pub fn confirm_clear(&mut self) -> Vec<AppAction> {
        match self.confirmation.take() {
            Some(PendingConfirmation::ClearChat) => {
                vec![AppAction::Emit(OutboundEvent::ClearChat), AppAction::Render]
            },
            None => vec![],
        }
    }

    /// Answer no to the pending confirmation.
    pub fn cancel_confirmation(&mut self) -> Vec<AppAction> {
        match self.confirmation.take() {
            Some(_) => vec![AppAction::Render],
            None => vec![],
        }
    }

    /// Release scheduled work before shutdown.
    pub fn teardown(&mut self) {
        self.notice.cancel();
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if self.confirmation.is_some() {
            return match key {
                KeyInput::Char('y' | 'Y') => self.confirm_clear(),
                _ => self.cancel_confirmation(),
            };
        }

        match key {
            KeyInput::Esc => self.quit(),
            KeyInput::Enter => self.submit(),
            KeyInput::Char(c) => {
                self.composer.insert(c);
                self.edited()
            },
            KeyInput::Backspace => {
                if self.composer.backspace() { self.edited() } else { vec![] }
            },
            KeyInput::Delete => {
                if self.composer.delete() { self.edited() } else { vec![] }
            },
            KeyInput::Left => self.move_cursor(Composer::move_left),
            KeyInput::Right => self.move_cursor(Composer::move_right),
            KeyInput::Home => self.move_cursor(Composer::move_home),
            KeyInput::End => self.move_cursor(Composer::move_end),
            KeyInput::Up => self.scroll_up(1),
            KeyInput::Down => self.scroll_down(1),
            KeyInput::PageUp => self.scroll_up(PAGE_SIZE),
            KeyInput::PageDown => self.scroll_down(PAGE_SIZE),
            KeyInput::Tab => vec![],
        }
    }

    fn submit(&mut self) -> Vec<AppAction> {
        if !self.identity.is_established() {
            return self.submit_username();
        }

        match Command::parse(self.composer.text()) {
            Some(Command::Clear) => {
                self.composer.clear();
                self.request_clear()
            },
            Some(Command::Quit) => self.quit(),
            None => self.submit_message(),
        }
    }

    /// Composer content changed. Report typing state once established.
    fn edited(&self) -> Vec<AppAction> {
        if self.identity.is_established() {
            let has_text = !self.composer.is_empty();
            vec![AppAction::Emit(OutboundEvent::Typing(has_text)), AppAction::Render]
        } else {
            vec![AppAction::Render]
        }
    }

    fn move_cursor(&mut self, f: fn(&mut Composer)) -> Vec<AppAction> {
        f(&mut self.composer);
        vec![AppAction::Render]
    }

    fn scroll_up(&mut self, by: usize) -> Vec<AppAction> {
        let max = self.conversation.visible_len().saturating_sub(1);
        self.scroll_back = self.scroll_back.saturating_add(by).min(max);
        vec![AppAction::Render]
    }

    fn scroll_down(&mut self, by: usize) -> Vec<AppAction> {
        self.scroll_back = self.scroll_back.saturating_sub(by);
        vec![AppAction::Render]
    }
}

impl<I> App<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent<I>) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick { now } => {
                if self.notice.expire(now) { vec![AppAction::Render] } else { vec![] }
            },
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Relay { event, now } => self.apply_inbound(event, now),
        }
    }

    /// Apply one relay event.
    pub fn apply_inbound(&mut self, event: InboundEvent, now: I) -> Vec<AppAction> {
        match event {
            InboundEvent::Connect { connection_id } => {
                debug!(%connection_id, "new connection epoch");
                self.identity.set_connection_id(connection_id);
            },
            InboundEvent::ChatHistory(messages) => {
                self.conversation.seed_history(messages);
                self.scroll_back = 0;
            },
            InboundEvent::MessageFromServerToClient(message) => {
                self.conversation.append_message(message);
                self.scroll_back = 0;
            },
            InboundEvent::ErrorMessage(text) => self.notice.show(text, now),
            InboundEvent::ActiveUsers(users) => self.presence.replace(users),
            InboundEvent::UserTyping(update) => self.typing.apply(update),
        }
        vec![AppAction::Render]
    }

    /// Next instant at which a [`AppEvent::Tick`] changes state.
    pub fn next_deadline(&self) -> Option<I> {
        self.notice.deadline()
    }
}

#[cfg(test)]
mod tests {
    use relaychat_proto::{ConnectionId, TypingUpdate};

    use super::*;

    type TestApp = App<Duration>;

    fn type_text(app: &mut TestApp, text: &str) -> Vec<AppAction> {
        text.chars().flat_map(|c| app.handle(AppEvent::Key(KeyInput::Char(c)))).collect()
    }

    fn established(username: &str) -> TestApp {
        let mut app = TestApp::new();
        type_text(&mut app, username);
        app.handle(AppEvent::Key(KeyInput::Enter));
        app
    }

    fn emits(actions: &[AppAction]) -> Vec<&OutboundEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                AppAction::Emit(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    fn relay(app: &mut TestApp, event: InboundEvent, secs: u64) -> Vec<AppAction> {
        app.handle(AppEvent::Relay { event, now: Duration::from_secs(secs) })
    }

    #[test]
    fn submitting_username_establishes_session() {
        let mut app = TestApp::new();
        let typing = type_text(&mut app, " ada ");
        assert!(emits(&typing).is_empty());

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));

        assert_eq!(emits(&actions), [&OutboundEvent::SetUsername(" ada ".into())]);
        assert!(app.identity().is_established());
        assert_eq!(app.identity().username(), " ada ");
        assert!(app.composer().is_empty());
    }

    #[test]
    fn blank_username_is_ignored() {
        let mut app = TestApp::new();
        type_text(&mut app, "   ");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));

        assert!(actions.is_empty());
        assert!(!app.identity().is_established());
        assert_eq!(app.composer().text(), "   ");
    }

    #[test]
    fn message_is_sent_raw_and_composer_cleared() {
        let mut app = established("ada");
        type_text(&mut app, "  hi  ");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));

        assert_eq!(
            emits(&actions),
            [&OutboundEvent::MessageFromClientToServer("  hi  ".into())]
        );
        assert!(app.composer().is_empty());
        assert!(app.conversation().messages().is_empty());
    }

    #[test]
    fn message_before_establishment_is_not_sent() {
        let mut app = TestApp::new();
        type_text(&mut app, "hello");

        assert!(app.submit_message().is_empty());
        assert_eq!(app.composer().text(), "hello");
    }

    #[test]
    fn edits_report_typing_state() {
        let mut app = established("ada");

        let actions = app.handle(AppEvent::Key(KeyInput::Char('h')));
        assert_eq!(emits(&actions), [&OutboundEvent::Typing(true)]);

        let actions = app.handle(AppEvent::Key(KeyInput::Backspace));
        assert_eq!(emits(&actions), [&OutboundEvent::Typing(false)]);

        // Nothing left to delete.
        assert!(app.handle(AppEvent::Key(KeyInput::Backspace)).is_empty());
    }

    #[test]
    fn cursor_moves_do_not_report_typing() {
        let mut app = established("ada");
        type_text(&mut app, "hi");

        let actions = app.handle(AppEvent::Key(KeyInput::Left));

        assert_eq!(actions, vec![AppAction::Render]);
    }

    #[test]
    fn clear_requires_confirmation() {
        let mut app = established("ada");
        type_text(&mut app, "/clear");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        assert!(emits(&actions).is_empty());
        assert_eq!(app.pending_confirmation(), Some(PendingConfirmation::ClearChat));

        let actions = app.handle(AppEvent::Key(KeyInput::Char('y')));
        assert_eq!(emits(&actions), [&OutboundEvent::ClearChat]);
        assert_eq!(app.pending_confirmation(), None);
    }

    #[test]
    fn declined_clear_emits_nothing() {
        let mut app = established("ada");
        app.request_clear();

        let actions = app.handle(AppEvent::Key(KeyInput::Char('n')));

        assert!(emits(&actions).is_empty());
        assert_eq!(app.pending_confirmation(), None);
        assert!(app.confirm_clear().is_empty());
    }

    #[test]
    fn clear_does_not_touch_local_log() {
        let mut app = established("ada");
        relay(&mut app, InboundEvent::ChatHistory(vec![ChatMessage::system("ada joined")]), 0);

        app.request_clear();
        app.confirm_clear();

        assert_eq!(app.conversation().messages().len(), 1);
    }

    #[test]
    fn quit_command_and_escape() {
        let mut app = established("ada");
        type_text(&mut app, "/quit");
        assert_eq!(app.handle(AppEvent::Key(KeyInput::Enter)), vec![AppAction::Quit]);
        assert_eq!(app.handle(AppEvent::Key(KeyInput::Esc)), vec![AppAction::Quit]);
    }

    #[test]
    fn unknown_slash_text_is_a_message() {
        let mut app = established("ada");
        type_text(&mut app, "/shrug");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));

        assert_eq!(emits(&actions), [&OutboundEvent::MessageFromClientToServer("/shrug".into())]);
    }

    #[test]
    fn error_notice_expires_three_seconds_after_latest() {
        let mut app = TestApp::new();
        relay(&mut app, InboundEvent::ErrorMessage("x".into()), 0);
        relay(&mut app, InboundEvent::ErrorMessage("y".into()), 1);

        assert_eq!(app.next_deadline(), Some(Duration::from_secs(4)));
        assert!(app.handle(AppEvent::Tick { now: Duration::from_secs(3) }).is_empty());
        assert_eq!(app.notice().text(), Some("y"));

        assert_eq!(app.handle(AppEvent::Tick { now: Duration::from_secs(4) }), vec![
            AppAction::Render
        ]);
        assert_eq!(app.notice().text(), None);
    }

    #[test]
    fn connect_replaces_connection_id() {
        let mut app = established("ada");
        relay(&mut app, InboundEvent::Connect { connection_id: ConnectionId::new("c1") }, 0);
        relay(&mut app, InboundEvent::Connect { connection_id: ConnectionId::new("c2") }, 0);

        let old = ChatMessage::user("c1", "ada", "before");
        let new = ChatMessage::user("c2", "ada", "after");
        assert_eq!(app.ownership(&old), Ownership::Other);
        assert_eq!(app.ownership(&new), Ownership::Mine);
        assert!(app.identity().is_established());
    }

    #[test]
    fn presence_and_typing_follow_relay() {
        let mut app = TestApp::new();
        relay(&mut app, InboundEvent::ActiveUsers(vec!["ada".into(), "bob".into()]), 0);
        relay(
            &mut app,
            InboundEvent::UserTyping(TypingUpdate { username: "bob".into(), typing: true }),
            0,
        );

        assert_eq!(app.presence().users(), ["ada", "bob"]);
        assert_eq!(app.typing().typer(), Some("bob"));

        relay(&mut app, InboundEvent::ActiveUsers(vec![]), 0);
        assert!(app.presence().is_empty());
    }

    #[test]
    fn scroll_is_bounded_and_snaps_back_on_new_message() {
        let mut app = TestApp::new();
        let history = (0..5).map(|i| ChatMessage::system(format!("note {i}"))).collect();
        relay(&mut app, InboundEvent::ChatHistory(history), 0);

        app.handle(AppEvent::Key(KeyInput::PageUp));
        assert_eq!(app.scroll_back(), 4);
        assert_eq!(app.scrolled_messages().len(), 1);

        app.handle(AppEvent::Key(KeyInput::Down));
        assert_eq!(app.scroll_back(), 3);

        relay(&mut app, InboundEvent::MessageFromServerToClient(ChatMessage::system("new")), 0);
        assert_eq!(app.scroll_back(), 0);
        assert_eq!(app.scrolled_messages().len(), 6);
    }

    #[test]
    fn teardown_cancels_notice() {
        let mut app = TestApp::new();
        relay(&mut app, InboundEvent::ErrorMessage("x".into()), 0);

        app.teardown();

        assert_eq!(app.next_deadline(), None);
    }
}
