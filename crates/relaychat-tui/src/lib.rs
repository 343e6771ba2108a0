//! Terminal UI for relaychat
//!
//! A thin shell over [`relaychat_app::Driver`] that provides terminal and
//! relay I/O. All orchestration logic lives in the generic
//! [`relaychat_app::Runtime`].
//!
//! This crate only handles terminal input, relay wiring and rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod terminal;
pub mod ui;

pub use relaychat_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError, convert_key};
