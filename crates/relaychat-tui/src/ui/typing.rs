//! Typing indicator line.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
};
use relaychat_app::App;

/// Render "<user> is typing..." or nothing.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let Some(typer) = app.typing().typer() else {
        return;
    };

    let line = Line::styled(
        format!(" {typer} is typing..."),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(Paragraph::new(line), area);
}
