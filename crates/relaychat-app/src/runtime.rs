//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop: it asks the [`Driver`] for the next
//! event, feeds it to the [`App`], and executes the resulting actions through
//! the driver.

use crate::{App, AppAction, Driver};

/// Generic runtime that orchestrates App and Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    app: App<D::Instant>,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime with a fresh app.
    pub fn new(driver: D) -> Self {
        Self::with_app(driver, App::new())
    }

    /// Create a runtime around an existing app.
    pub fn with_app(driver: D, app: App<D::Instant>) -> Self {
        Self { driver, app }
    }

    /// Run until the app quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        let result = loop {
            match self.process_next().await {
                Ok(true) => {},
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.shutdown();
        result
    }

    /// Process one event.
    ///
    /// Returns `false` if the application should stop.
    pub async fn process_next(&mut self) -> Result<bool, D::Error> {
        let deadline = self.app.next_deadline();
        let Some(event) = self.driver.poll_event(deadline).await? else {
            return Ok(false);
        };

        let actions = self.app.handle(event);
        self.execute(actions)
    }

    /// Execute app actions. Returns `false` on quit.
    fn execute(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(false),
                AppAction::Emit(event) => self.driver.emit(event)?,
            }
        }
        Ok(true)
    }

    /// Cancel pending timers and stop the driver.
    pub fn shutdown(&mut self) {
        self.app.teardown();
        self.driver.stop();
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<D::Instant> {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App<D::Instant> {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
