//! Join form
//!
//! Shown until the relay has been given a username.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};
use relaychat_app::App;

use super::{centered, input};

const FORM_WIDTH: u16 = 44;
const FORM_HEIGHT: u16 = 7;

/// Render the centered join form.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let form = centered(area, FORM_WIDTH, FORM_HEIGHT);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Join the Chat ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(form);

    frame.render_widget(Clear, form);
    frame.render_widget(block, form);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(inner);

    let [hint_area, input_area] = chunks.as_ref() else {
        return;
    };

    let hint = Paragraph::new(Line::styled(
        "Pick a username and press Enter",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(hint, *hint_area);
    input::render(frame, app.composer(), " Username ", *input_area);
}
