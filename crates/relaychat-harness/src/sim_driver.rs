//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing: events come from a queue, time comes from a
//! virtual clock, and emits are captured instead of sent.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use relaychat_app::{App, AppEvent, Driver, KeyInput};
use relaychat_proto::{InboundEvent, OutboundEvent};
use tracing::trace;

use crate::{AppSnapshot, InvariantRegistry, SimInstant};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection.
#[derive(Default)]
struct SharedState {
    now: SimInstant,
    pending_events: VecDeque<AppEvent<SimInstant>>,
    /// Drained by [`SimDriver::take_outgoing`].
    outgoing: Vec<OutboundEvent>,
    /// Every emit, never drained.
    emitted: Vec<OutboundEvent>,
    renders: usize,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share one queue and clock, so a test can keep a handle for
/// injection while the runtime owns another.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a new simulation driver at virtual time zero.
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(SharedState::default())), invariants: None }
    }

    /// Check `registry` on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Queue an `AppEvent`.
    pub fn inject_event(&self, event: AppEvent<SimInstant>) {
        self.lock().pending_events.push_back(event);
    }

    /// Queue a key press.
    pub fn inject_key(&self, key: KeyInput) {
        self.inject_event(AppEvent::Key(key));
    }

    /// Queue one key press per character of `text`.
    pub fn inject_text(&self, text: &str) {
        let mut state = self.lock();
        state.pending_events.extend(text.chars().map(|c| AppEvent::Key(KeyInput::Char(c))));
    }

    /// Queue a relay event stamped with the current virtual time.
    pub fn inject_relay(&self, event: InboundEvent) {
        let mut state = self.lock();
        let now = state.now;
        state.pending_events.push_back(AppEvent::Relay { event, now });
    }

    /// Move the clock forward and queue a tick at the new time.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now = state.now + by;
        let now = state.now;
        trace!(?now, "virtual clock advanced");
        state.pending_events.push_back(AppEvent::Tick { now });
    }

    /// Take emits captured since the last call.
    pub fn take_outgoing(&self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.lock().outgoing)
    }

    /// Every emit so far.
    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.lock().emitted.clone()
    }

    /// Whether queued events remain.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Whether the runtime has stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Snapshot `app` for invariant checking.
    pub fn snapshot(&self, app: &App<SimInstant>) -> AppSnapshot {
        let state = self.lock();
        AppSnapshot::capture(app, state.now, &state.emitted)
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App<SimInstant>, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&self.snapshot(app), context);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(
        &mut self,
        deadline: Option<SimInstant>,
    ) -> Result<Option<AppEvent<SimInstant>>, Self::Error> {
        let mut state = self.lock();
        if let Some(event) = state.pending_events.pop_front() {
            return Ok(Some(event));
        }

        let now = state.now;
        Ok(deadline.filter(|deadline| *deadline <= now).map(|_| AppEvent::Tick { now }))
    }

    fn emit(&mut self, event: OutboundEvent) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SimDriverError(format!("emit {} after stop", event.name())));
        }
        trace!(event = event.name(), "captured emit");
        state.outgoing.push(event.clone());
        state.emitted.push(event);
        Ok(())
    }

    fn now(&self) -> SimInstant {
        self.lock().now
    }

    fn render(&mut self, app: &App<SimInstant>) -> Result<(), Self::Error> {
        let renders = {
            let mut state = self.lock();
            state.renders += 1;
            state.renders
        };
        self.check_invariants(app, &format!("at render #{renders}"));
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}
