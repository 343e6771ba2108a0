//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the app at a point in time.
//! Invariants operate on snapshots rather than live state so every check in
//! one pass sees the same data.

use std::time::Duration;

use relaychat_app::App;
use relaychat_proto::{ChatMessage, OutboundEvent};

use crate::SimInstant;

/// Snapshot of one client's observable state.
#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    /// Username has been submitted.
    pub established: bool,
    /// Chosen username.
    pub username: String,
    /// Every stored message.
    pub messages: Vec<ChatMessage>,
    /// Messages the view renders.
    pub visible: Vec<ChatMessage>,
    /// Scroll offset from the newest visible message.
    pub scroll_back: usize,
    /// Notice text, if showing.
    pub notice_text: Option<String>,
    /// Time until the notice expires, if armed.
    pub notice_remaining: Option<Duration>,
    /// Notice lifetime.
    pub notice_ttl: Duration,
    /// Every event emitted to the relay so far, in order.
    pub emitted: Vec<OutboundEvent>,
}

impl AppSnapshot {
    /// Capture `app` at `now`, along with the emit history.
    pub fn capture(app: &App<SimInstant>, now: SimInstant, emitted: &[OutboundEvent]) -> Self {
        Self {
            established: app.identity().is_established(),
            username: app.identity().username().to_string(),
            messages: app.conversation().messages().to_vec(),
            visible: app.conversation().visible().cloned().collect(),
            scroll_back: app.scroll_back(),
            notice_text: app.notice().text().map(str::to_string),
            notice_remaining: app.notice().deadline().map(|deadline| deadline - now),
            notice_ttl: app.notice().ttl(),
            emitted: emitted.to_vec(),
        }
    }
}
