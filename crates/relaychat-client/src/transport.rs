//! WebSocket transport for the relay session.
//!
//! Provides [`RelayConnection`], a handle to a background task that owns the
//! socket. The task feeds frames through a [`RelaySession`], writes what the
//! session asks it to, and hands decoded events to [`Subscriptions`]. When
//! the session gives up, the task reconnects with exponential backoff and a
//! brand-new session; the caller only notices a fresh `connect` event.

use std::fmt::Display;

use futures::{Sink, SinkExt, StreamExt};
use relaychat_proto::{EventName, OutboundEvent};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval, sleep, timeout},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    ConfigError, RelayConfig, RelaySession, SessionAction, SessionEvent, Subscription,
    Subscriptions,
};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Relay address is unusable.
    #[error("invalid relay address: {0}")]
    Config(#[from] ConfigError),
}

/// Handle to the relay connection task.
///
/// Emits are fire-and-forget. Inbound events reach callers through
/// [`RelayConnection::subscribe`]. Dropping the handle closes the socket.
pub struct RelayConnection {
    outbound: mpsc::Sender<OutboundEvent>,
    subscriptions: Subscriptions,
    abort_handle: tokio::task::AbortHandle,
}

impl RelayConnection {
    /// Start connecting to the relay in the background.
    ///
    /// Must be called from within a Tokio runtime. Returns immediately; the
    /// first `connect` event arrives once the namespace is joined. Events
    /// dispatched before a later [`RelayConnection::subscribe`] are not
    /// replayed; use [`RelayConnection::open_subscribed`] to catch the first
    /// `connect` and `chatHistory`.
    pub fn open(config: RelayConfig) -> Result<Self, TransportError> {
        Self::start(config, Subscriptions::new())
    }

    /// Start connecting with a subscription to `names` already registered.
    pub fn open_subscribed(
        config: RelayConfig,
        names: impl IntoIterator<Item = EventName>,
    ) -> Result<(Self, Subscription), TransportError> {
        let subscriptions = Subscriptions::new();
        let subscription = subscriptions.subscribe_many(names);
        Ok((Self::start(config, subscriptions)?, subscription))
    }

    fn start(config: RelayConfig, subscriptions: Subscriptions) -> Result<Self, TransportError> {
        let endpoint = config.endpoint()?;
        // Err only means a provider is already installed
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer.max(1));
        let task = ConnectionTask {
            websocket_url: endpoint.websocket_url,
            namespace: endpoint.namespace,
            config,
            outbound: outbound_rx,
            subscriptions: subscriptions.clone(),
        };
        let handle = tokio::spawn(task.run());

        Ok(Self { outbound: outbound_tx, subscriptions, abort_handle: handle.abort_handle() })
    }

    /// Queue `event` for the relay.
    ///
    /// Dropped with a warning if the queue is full or the task has stopped.
    /// Events emitted while disconnected are dropped by the session.
    pub fn emit(&self, event: OutboundEvent) {
        if let Err(e) = self.outbound.try_send(event) {
            warn!(error = %e, "dropping outbound event");
        }
    }

    /// Subscribe to one inbound event name.
    pub fn subscribe(&self, name: EventName) -> Subscription {
        self.subscriptions.subscribe(name)
    }

    /// Subscribe to several inbound event names through one receiver.
    pub fn subscribe_many(&self, names: impl IntoIterator<Item = EventName>) -> Subscription {
        self.subscriptions.subscribe_many(names)
    }

    /// Stop the connection task.
    pub fn close(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Why one socket's lifetime ended.
enum Exit {
    /// Handle dropped; stop for good.
    Shutdown,
    /// Connection lost; try again.
    Reconnect(String),
}

struct ConnectionTask {
    websocket_url: String,
    namespace: String,
    config: RelayConfig,
    outbound: mpsc::Receiver<OutboundEvent>,
    subscriptions: Subscriptions,
}

impl ConnectionTask {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            match timeout(self.config.connect_timeout, connect_async(self.websocket_url.as_str()))
                .await
            {
                Ok(Ok((stream, _response))) => {
                    info!(url = %self.websocket_url, "relay socket open");
                    attempt = 0;
                    match self.drive(stream).await {
                        Exit::Shutdown => return,
                        Exit::Reconnect(reason) => warn!(%reason, "relay connection lost"),
                    }
                },
                Ok(Err(e)) => warn!(attempt, error = %e, "relay connect failed"),
                Err(_) => warn!(attempt, "relay connect timed out"),
            }

            let delay = self.config.backoff(attempt);
            attempt = attempt.saturating_add(1);
            debug!(?delay, "reconnecting");
            sleep(delay).await;

            if !self.discard_stale_emits() {
                return;
            }
        }
    }

    /// Drop emits queued while offline. `false` once the handle is gone.
    fn discard_stale_emits(&mut self) -> bool {
        loop {
            match self.outbound.try_recv() {
                Ok(event) => warn!(event = event.name(), "dropping emit queued while offline"),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    async fn drive<S>(&mut self, stream: S) -> Exit
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut source) = stream.split();
        let mut session = RelaySession::new(self.namespace.clone());
        let mut liveness = interval(self.config.liveness_check);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut next = Some(SessionEvent::Opened { now: Instant::now() });

        loop {
            if let Some(event) = next.take() {
                match session.handle(event) {
                    Ok(actions) => {
                        if let Some(exit) = self.execute(actions, &mut sink).await {
                            return exit;
                        }
                    },
                    Err(e) => warn!(error = %e, "discarding relay frame"),
                }
            }

            next = tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        Some(SessionEvent::TextReceived { text: text.as_str().to_string(), now: Instant::now() })
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = session.handle(SessionEvent::Closed);
                        return Exit::Reconnect("websocket closed".to_string());
                    },
                    Some(Ok(_)) => None,
                    Some(Err(e)) => return Exit::Reconnect(format!("websocket error: {e}")),
                },
                event = self.outbound.recv() => match event {
                    Some(event) => Some(SessionEvent::Emit(event)),
                    None => {
                        let _ = sink.close().await;
                        return Exit::Shutdown;
                    },
                },
                _ = liveness.tick() => Some(SessionEvent::Tick { now: Instant::now() }),
            };
        }
    }

    async fn execute<K>(&self, actions: Vec<SessionAction>, sink: &mut K) -> Option<Exit>
    where
        K: Sink<Message> + Unpin,
        K::Error: Display,
    {
        for action in actions {
            match action {
                SessionAction::SendText(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        return Some(Exit::Reconnect(format!("websocket write failed: {e}")));
                    }
                },
                SessionAction::Deliver(event) => {
                    let delivered = self.subscriptions.dispatch(&event);
                    debug!(event = %event.name(), delivered, "relay event");
                },
                SessionAction::Reconnect { reason } => return Some(Exit::Reconnect(reason)),
            }
        }
        None
    }
}
