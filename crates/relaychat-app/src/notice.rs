//! Self-expiring error notice.
//!
//! A notice holds one text and one deadline. Showing a new notice replaces
//! both, so an older expiry can never clear a newer text.

use std::{ops::Add, time::Duration};

/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Transient notice with a single expiry slot.
///
/// Generic over the instant type so simulation can use virtual time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice<I> {
    text: Option<String>,
    deadline: Option<I>,
    ttl: Duration,
}

impl<I> Default for Notice<I> {
    fn default() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }
}

impl<I> Notice<I> {
    /// Empty notice with a custom lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { text: None, deadline: None, ttl }
    }

    /// Text currently shown.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Lifetime applied by [`Notice::show`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop the notice and its pending expiry.
    pub fn cancel(&mut self) {
        self.text = None;
        self.deadline = None;
    }
}

impl<I> Notice<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Show `text` until `now + ttl`, superseding any current notice.
    pub fn show(&mut self, text: impl Into<String>, now: I) {
        self.text = Some(text.into());
        self.deadline = Some(now + self.ttl);
    }

    /// Clear the notice if its deadline has passed.
    ///
    /// Returns `true` if something was cleared.
    pub fn expire(&mut self, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.cancel();
                true
            },
            _ => false,
        }
    }

    /// Pending expiry, if a notice is showing.
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }
}
