//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use relaychat_app::is_visible;
use relaychat_proto::OutboundEvent;

use super::{AppSnapshot, Invariant, InvariantResult, Violation};

/// Notice text and expiry are set and cleared together, and the expiry is
/// never further away than one TTL.
pub struct NoticeDeadlineConsistent;

impl Invariant for NoticeDeadlineConsistent {
    fn name(&self) -> &'static str {
        "NoticeDeadlineConsistent"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        if state.notice_text.is_some() != state.notice_remaining.is_some() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "notice text {:?} with expiry {:?}",
                    state.notice_text, state.notice_remaining
                ),
            });
        }
        if let Some(remaining) = state.notice_remaining
            && remaining > state.notice_ttl
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!("expiry {remaining:?} away exceeds ttl {:?}", state.notice_ttl),
            });
        }
        Ok(())
    }
}

/// Chat events are only emitted after exactly one `setUsername`.
pub struct OutboundRequiresEstablished;

impl Invariant for OutboundRequiresEstablished {
    fn name(&self) -> &'static str {
        "OutboundRequiresEstablished"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let mut username_sent = false;
        for (index, event) in state.emitted.iter().enumerate() {
            match event {
                OutboundEvent::SetUsername(_) if username_sent => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("second setUsername at emit #{index}"),
                    });
                },
                OutboundEvent::SetUsername(_) => username_sent = true,
                other if !username_sent => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("{} emitted before setUsername (#{index})", other.name()),
                    });
                },
                _ => {},
            }
        }
        if username_sent != state.established {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "established={} but setUsername sent={username_sent}",
                    state.established
                ),
            });
        }
        Ok(())
    }
}

/// The rendered log is the stored log minus departure notices, in order.
pub struct VisibleSubsetOfStored;

impl Invariant for VisibleSubsetOfStored {
    fn name(&self) -> &'static str {
        "VisibleSubsetOfStored"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let expected: Vec<_> = state.messages.iter().filter(|m| is_visible(m)).collect();
        let actual: Vec<_> = state.visible.iter().collect();
        if expected != actual {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} visible of {} stored, expected {}",
                    actual.len(),
                    state.messages.len(),
                    expected.len()
                ),
            });
        }
        Ok(())
    }
}

/// Scrolling never hides every visible message.
pub struct ScrollWithinBounds;

impl Invariant for ScrollWithinBounds {
    fn name(&self) -> &'static str {
        "ScrollWithinBounds"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        let max = state.visible.len().saturating_sub(1);
        if state.scroll_back > max {
            return Err(Violation {
                invariant: self.name(),
                message: format!("scroll_back {} beyond {max}", state.scroll_back),
            });
        }
        Ok(())
    }
}

/// An established session always has a non-blank username.
pub struct EstablishedHasUsername;

impl Invariant for EstablishedHasUsername {
    fn name(&self) -> &'static str {
        "EstablishedHasUsername"
    }

    fn check(&self, state: &AppSnapshot) -> InvariantResult {
        if state.established && state.username.trim().is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("established with blank username {:?}", state.username),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use relaychat_proto::ChatMessage;

    use super::*;

    #[test]
    fn notice_without_deadline_is_violation() {
        let state =
            AppSnapshot { notice_text: Some("x".into()), ..AppSnapshot::default() };
        assert!(NoticeDeadlineConsistent.check(&state).is_err());
    }

    #[test]
    fn notice_beyond_ttl_is_violation() {
        let state = AppSnapshot {
            notice_text: Some("x".into()),
            notice_remaining: Some(Duration::from_secs(4)),
            notice_ttl: Duration::from_secs(3),
            ..AppSnapshot::default()
        };
        assert!(NoticeDeadlineConsistent.check(&state).is_err());
    }

    #[test]
    fn message_before_username_is_violation() {
        let state = AppSnapshot {
            established: true,
            username: "ada".into(),
            emitted: vec![
                OutboundEvent::MessageFromClientToServer("hi".into()),
                OutboundEvent::SetUsername("ada".into()),
            ],
            ..AppSnapshot::default()
        };
        assert!(OutboundRequiresEstablished.check(&state).is_err());
    }

    #[test]
    fn ordered_emits_pass() {
        let state = AppSnapshot {
            established: true,
            username: "ada".into(),
            emitted: vec![
                OutboundEvent::SetUsername("ada".into()),
                OutboundEvent::Typing(true),
                OutboundEvent::ClearChat,
            ],
            ..AppSnapshot::default()
        };
        assert!(OutboundRequiresEstablished.check(&state).is_ok());
    }

    #[test]
    fn shown_departure_notice_is_violation() {
        let left = ChatMessage::system("bob left the chat");
        let state = AppSnapshot {
            messages: vec![left.clone()],
            visible: vec![left],
            ..AppSnapshot::default()
        };
        assert!(VisibleSubsetOfStored.check(&state).is_err());
    }

    #[test]
    fn scroll_past_oldest_is_violation() {
        let state = AppSnapshot {
            visible: vec![ChatMessage::system("a")],
            scroll_back: 1,
            ..AppSnapshot::default()
        };
        assert!(ScrollWithinBounds.check(&state).is_err());
    }
}
