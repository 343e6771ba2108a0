//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::{fmt::Debug, future::Future, ops::Add, time::Duration};

use relaychat_proto::OutboundEvent;

use crate::{App, AppEvent};

/// Time representation usable by the app (real or virtual).
pub trait AppInstant:
    Copy + Ord + Send + Sync + Debug + Add<Duration, Output = Self> + 'static
{
}

impl<T> AppInstant for T where
    T: Copy + Ord + Send + Sync + Debug + Add<Duration, Output = T> + 'static
{
}

/// Abstracts I/O operations for the application runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, the WebSocket relay connection
///   for relay events, tokio for time
/// - **Simulation**: queued events and a virtual clock
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: AppInstant;

    /// Wait for the next input event.
    ///
    /// Returns [`AppEvent::Tick`] once `deadline` has passed without other
    /// input. Returns `None` when input is exhausted and the runtime should
    /// stop.
    fn poll_event(
        &mut self,
        deadline: Option<Self::Instant>,
    ) -> impl Future<Output = Result<Option<AppEvent<Self::Instant>>, Self::Error>> + Send;

    /// Send an event to the relay. Must not block.
    ///
    /// # Errors
    ///
    /// Returns an error only if the driver itself is broken. A relay that is
    /// offline is not an error.
    fn emit(&mut self, event: OutboundEvent) -> Result<(), Self::Error>;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App<Self::Instant>) -> Result<(), Self::Error>;

    /// Stop the relay connection and clean up resources.
    fn stop(&mut self);
}
