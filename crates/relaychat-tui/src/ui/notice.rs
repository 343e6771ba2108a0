//! Error toast
//!
//! Drawn over the top-right corner of the chat area while a relay error
//! notice is live.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};
use relaychat_app::App;

const TOAST_HEIGHT: u16 = 3;
const TOAST_MARGIN: u16 = 1;
const BORDER_SIZE: u16 = 2;

/// Render the notice toast inside `area`, if any.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let Some(text) = app.notice().text() else {
        return;
    };

    let text_width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    let width = text_width
        .saturating_add(BORDER_SIZE + 2)
        .min(area.width.saturating_sub(TOAST_MARGIN * 2));
    let toast = Rect {
        x: area.right().saturating_sub(width + TOAST_MARGIN),
        y: area.y.saturating_add(TOAST_MARGIN),
        width,
        height: TOAST_HEIGHT.min(area.height.saturating_sub(TOAST_MARGIN)),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");
    let paragraph = Paragraph::new(format!(" {text}"))
        .style(Style::default().fg(Color::Red))
        .block(block);

    frame.render_widget(Clear, toast);
    frame.render_widget(paragraph, toast);
}
