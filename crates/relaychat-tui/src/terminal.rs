//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Relay events arrive through a
//! subscription on the [`RelayConnection`].

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use relaychat_app::{App, AppEvent, Driver};
use relaychat_client::{
    RelayConfig, Subscription,
    transport::{RelayConnection, TransportError},
};
use relaychat_proto::{EventName, OutboundEvent};
use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tracing::warn;

use crate::{KeyInput, ui};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the terminal (raw mode, alternate screen) and the relay connection.
/// Both are released on drop.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    connection: RelayConnection,
    inbound: Subscription,
}

impl TerminalDriver {
    /// Connect to the relay and take over the terminal.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: RelayConfig) -> Result<Self, TerminalError> {
        let (connection, inbound) = RelayConnection::open_subscribed(config, EventName::ALL)?;

        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, connection, inbound })
    }
}

/// Convert crossterm `KeyCode` to `KeyInput`.
pub fn convert_key(code: KeyCode) -> Option<KeyInput> {
    match code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::PageUp => Some(KeyInput::PageUp),
        KeyCode::PageDown => Some(KeyInput::PageDown),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<Option<AppEvent<Instant>>, Self::Error> {
        loop {
            let timer = async {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                // Terminal events
                maybe_event = self.event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                            if let Some(key) = convert_key(key_event.code) {
                                return Ok(Some(AppEvent::Key(key)));
                            }
                        },
                        Some(Ok(Event::Resize(cols, rows))) => {
                            return Ok(Some(AppEvent::Resize(cols, rows)));
                        },
                        Some(Ok(_)) => {},
                        Some(Err(e)) => return Err(TerminalError::Io(e)),
                        None => return Ok(None),
                    }
                }

                // Relay events
                maybe_inbound = self.inbound.recv() => {
                    let Some(event) = maybe_inbound else {
                        warn!("relay subscription closed");
                        return Ok(None);
                    };
                    return Ok(Some(AppEvent::Relay { event, now: Instant::now() }));
                }

                // Notice expiry
                () = timer => {
                    return Ok(Some(AppEvent::Tick { now: Instant::now() }));
                }
            }
        }
    }

    fn emit(&mut self, event: OutboundEvent) -> Result<(), Self::Error> {
        self.connection.emit(event);
        Ok(())
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App<Instant>) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.connection.close();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_and_navigation_keys_convert() {
        assert_eq!(convert_key(KeyCode::Char('y')), Some(KeyInput::Char('y')));
        assert_eq!(convert_key(KeyCode::Enter), Some(KeyInput::Enter));
        assert_eq!(convert_key(KeyCode::Esc), Some(KeyInput::Esc));
        assert_eq!(convert_key(KeyCode::PageUp), Some(KeyInput::PageUp));
        assert_eq!(convert_key(KeyCode::End), Some(KeyInput::End));
    }

    #[test]
    fn function_keys_are_ignored() {
        assert_eq!(convert_key(KeyCode::F(1)), None);
        assert_eq!(convert_key(KeyCode::Insert), None);
    }
}
