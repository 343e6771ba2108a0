//! Named-event subscriptions.
//!
//! Handlers are channels: [`Subscriptions::subscribe`] returns a
//! [`Subscription`] whose receiver yields every matching inbound event in
//! arrival order. Dropping the handle unsubscribes it, so a consumer that
//! goes away can never be called again.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use relaychat_proto::{EventName, InboundEvent};
use tokio::sync::mpsc;
use tracing::debug;

type Sender = mpsc::UnboundedSender<InboundEvent>;

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    handlers: BTreeMap<EventName, Vec<(u64, Sender)>>,
}

/// Registry of live subscriptions, shared with the transport task.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    inner: Arc<Mutex<Registry>>,
}

impl Subscriptions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event name.
    pub fn subscribe(&self, name: EventName) -> Subscription {
        self.subscribe_many([name])
    }

    /// Subscribe to several event names through one receiver.
    ///
    /// Events keep their relative arrival order across names.
    pub fn subscribe_many(&self, names: impl IntoIterator<Item = EventName>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.lock();

        let id = registry.next_id;
        registry.next_id += 1;

        let mut subscribed = Vec::new();
        for name in names {
            registry.handlers.entry(name).or_default().push((id, tx.clone()));
            subscribed.push(name);
        }

        Subscription { id, names: subscribed, receiver: rx, registry: Arc::downgrade(&self.inner) }
    }

    /// Deliver `event` to every subscriber of its name.
    ///
    /// Returns how many subscribers received it.
    pub fn dispatch(&self, event: &InboundEvent) -> usize {
        let name = event.name();
        let mut registry = self.lock();
        let Some(handlers) = registry.handlers.get_mut(&name) else {
            debug!(event = %name, "no subscribers");
            return 0;
        };

        handlers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        handlers.len()
    }

    /// Number of live subscribers for `name`.
    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.lock().handlers.get(&name).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live subscription handle. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    names: Vec<EventName>,
    receiver: mpsc::UnboundedReceiver<InboundEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Names this handle receives.
    pub fn names(&self) -> &[EventName] {
        &self.names
    }

    /// Wait for the next event.
    ///
    /// `None` once the registry is gone and every buffered event was read.
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.receiver.recv().await
    }

    /// Next buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<InboundEvent> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving. Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        for name in &self.names {
            if let Some(handlers) = registry.handlers.get_mut(name) {
                handlers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use relaychat_proto::TypingUpdate;

    use super::*;

    fn typing(username: &str) -> InboundEvent {
        InboundEvent::UserTyping(TypingUpdate { username: username.into(), typing: true })
    }

    #[test]
    fn dispatch_reaches_matching_subscribers_only() {
        let subs = Subscriptions::new();
        let mut typing_sub = subs.subscribe(EventName::UserTyping);
        let mut users_sub = subs.subscribe(EventName::ActiveUsers);

        assert_eq!(subs.dispatch(&typing("ada")), 1);

        assert_eq!(typing_sub.try_recv(), Some(typing("ada")));
        assert_eq!(users_sub.try_recv(), None);
    }

    #[test]
    fn dropped_subscription_is_never_called() {
        let subs = Subscriptions::new();
        let sub = subs.subscribe(EventName::UserTyping);
        assert_eq!(subs.subscriber_count(EventName::UserTyping), 1);

        drop(sub);

        assert_eq!(subs.subscriber_count(EventName::UserTyping), 0);
        assert_eq!(subs.dispatch(&typing("ada")), 0);
    }

    #[test]
    fn subscribe_many_preserves_arrival_order() {
        let subs = Subscriptions::new();
        let mut sub = subs.subscribe_many([EventName::ActiveUsers, EventName::UserTyping]);

        subs.dispatch(&InboundEvent::ActiveUsers(vec!["ada".into()]));
        subs.dispatch(&typing("bob"));
        subs.dispatch(&InboundEvent::ActiveUsers(vec![]));

        assert_eq!(sub.try_recv(), Some(InboundEvent::ActiveUsers(vec!["ada".into()])));
        assert_eq!(sub.try_recv(), Some(typing("bob")));
        assert_eq!(sub.try_recv(), Some(InboundEvent::ActiveUsers(vec![])));
    }

    #[test]
    fn unsubscribe_removes_every_name() {
        let subs = Subscriptions::new();
        let sub = subs.subscribe_many(EventName::ALL);

        sub.unsubscribe();

        for name in EventName::ALL {
            assert_eq!(subs.subscriber_count(name), 0);
        }
    }

    #[test]
    fn handle_outlives_registry() {
        let subs = Subscriptions::new();
        let mut sub = subs.subscribe(EventName::ErrorMessage);
        subs.dispatch(&InboundEvent::ErrorMessage("taken".into()));

        drop(subs);

        assert_eq!(sub.try_recv(), Some(InboundEvent::ErrorMessage("taken".into())));
        drop(sub);
    }

    #[tokio::test]
    async fn recv_waits_for_dispatch() {
        let subs = Subscriptions::new();
        let mut sub = subs.subscribe(EventName::ActiveUsers);

        let sender = subs.clone();
        tokio::spawn(async move {
            sender.dispatch(&InboundEvent::ActiveUsers(vec!["ada".into()]));
        });

        assert_eq!(sub.recv().await, Some(InboundEvent::ActiveUsers(vec!["ada".into()])));
    }
}
