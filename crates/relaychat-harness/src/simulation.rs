//! Single-client simulation.
//!
//! Wraps the production [`Runtime`] around a [`SimDriver`] and steps it
//! synchronously. [`SimDriver`] never waits, so its futures are always ready
//! and a plain `block_on` is enough.

use std::time::Duration;

use futures::executor::block_on;
use relaychat_app::{App, KeyInput, Runtime};
use relaychat_proto::{ConnectionId, InboundEvent, OutboundEvent};

use crate::{InvariantRegistry, SimDriver, SimDriverError, SimInstant};

/// One app under simulation.
pub struct Simulation {
    runtime: Runtime<SimDriver>,
    driver: SimDriver,
    quit: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Simulation checking the standard invariants on every render.
    pub fn new() -> Self {
        Self::with_driver(SimDriver::new().with_invariants(InvariantRegistry::standard()))
    }

    /// Simulation over a caller-configured driver.
    pub fn with_driver(driver: SimDriver) -> Self {
        Self { runtime: Runtime::new(driver.clone()), driver, quit: false }
    }

    /// Simulation that is already connected as `connection_id` and joined as
    /// `username`.
    pub fn joined(connection_id: &str, username: &str) -> Result<Self, SimDriverError> {
        let mut sim = Self::new();
        sim.relay(InboundEvent::Connect { connection_id: ConnectionId::new(connection_id) })?;
        sim.type_text(username)?;
        sim.key(KeyInput::Enter)?;
        sim.driver.take_outgoing();
        Ok(sim)
    }

    /// Press one key and process it.
    pub fn key(&mut self, key: KeyInput) -> Result<(), SimDriverError> {
        self.driver.inject_key(key);
        self.run_until_idle()
    }

    /// Type `text` one character at a time.
    pub fn type_text(&mut self, text: &str) -> Result<(), SimDriverError> {
        self.driver.inject_text(text);
        self.run_until_idle()
    }

    /// Deliver a relay event at the current virtual time.
    pub fn relay(&mut self, event: InboundEvent) -> Result<(), SimDriverError> {
        self.driver.inject_relay(event);
        self.run_until_idle()
    }

    /// Advance virtual time and process the resulting tick.
    pub fn advance(&mut self, by: Duration) -> Result<(), SimDriverError> {
        self.driver.advance(by);
        self.run_until_idle()
    }

    /// Process queued events until none remain or the app quits.
    pub fn run_until_idle(&mut self) -> Result<(), SimDriverError> {
        while !self.quit && self.driver.has_pending() {
            if !block_on(self.runtime.process_next())? {
                self.quit = true;
                self.runtime.shutdown();
            }
        }
        Ok(())
    }

    /// Emits captured since the last call.
    pub fn take_outgoing(&self) -> Vec<OutboundEvent> {
        self.driver.take_outgoing()
    }

    /// App under test.
    pub fn app(&self) -> &App<SimInstant> {
        self.runtime.app()
    }

    /// Mutable access to the app, bypassing the driver.
    pub fn app_mut(&mut self) -> &mut App<SimInstant> {
        self.runtime.app_mut()
    }

    /// Driver handle.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        relaychat_app::Driver::now(&self.driver)
    }

    /// Whether the app has quit.
    pub fn has_quit(&self) -> bool {
        self.quit
    }
}
