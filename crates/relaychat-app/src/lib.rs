//! Application layer for relaychat
//!
//! Pure state machines and a generic runtime for chat state and relay
//! orchestration, so simulation tests run the same code as the terminal
//! client.
//!
//! # Components
//!
//! - [`App`]: Chat state machine (identity, conversation, presence, notices,
//!   composer, commands)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod composer;
mod driver;
mod event;
mod input;
mod notice;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use composer::{Command, Composer};
pub use driver::{AppInstant, Driver};
pub use event::AppEvent;
pub use input::KeyInput;
pub use notice::{NOTICE_TTL, Notice};
pub use runtime::Runtime;
pub use state::{
    Conversation, Identity, Ownership, PendingConfirmation, Presence, SessionPhase,
    TypingIndicator, is_visible,
};
