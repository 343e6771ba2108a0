//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod input;
mod join;
mod notice;
mod status;
mod typing;
mod users;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
};
use relaychat_app::App;

/// Render the entire UI.
///
/// Shows the join form until a username has been accepted, then the chat
/// screen.
pub fn render<I>(frame: &mut Frame, app: &App<I>) {
    if app.identity().is_established() {
        render_chat_screen(frame, app);
    } else {
        join::render(frame, app, frame.area());
    }
}

fn render_chat_screen<I>(frame: &mut Frame, app: &App<I>) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const TYPING_HEIGHT: u16 = 1;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(TYPING_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, typing_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    let chat_area = render_main_area(frame, app, *main_area);
    typing::render(frame, app, *typing_area);
    input::render(frame, app.composer(), " Message ", *input_area);
    status::render(frame, app, *status_area);

    if let Some(chat_area) = chat_area {
        notice::render(frame, app, chat_area);
    }
}

/// Render the main area (users sidebar + chat). Returns the chat area.
fn render_main_area<I>(frame: &mut Frame, app: &App<I>, area: Rect) -> Option<Rect> {
    const USERS_SIDEBAR_WIDTH: u16 = 20;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(USERS_SIDEBAR_WIDTH),
            Constraint::Min(CHAT_AREA_MIN_WIDTH),
        ])
        .split(area);

    let [users_area, chat_area] = chunks.as_ref() else {
        return None;
    };

    users::render(frame, app, *users_area);
    chat::render(frame, app, *chat_area);
    Some(*chat_area)
}

/// Rectangle of at most `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let rows = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).split(area);
    let Some(row) = rows.first() else {
        return area;
    };
    let cols = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).split(*row);
    cols.first().copied().unwrap_or(*row)
}
