//! Status bar
//!
//! Displays connection status, or the pending confirmation prompt.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use relaychat_app::App;

const HINTS: &str = " | /clear /quit | Esc to quit";

/// Render the status bar.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let status_line = if let Some(confirmation) = app.pending_confirmation() {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                confirmation.prompt(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let connection_status = match app.identity().connection_id() {
            Some(connection_id) => Span::styled(
                format!("Connected ({connection_id})"),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("connecting…", Style::default().fg(Color::Yellow)),
        };

        Line::from(vec![
            Span::raw(" "),
            connection_status,
            Span::styled(HINTS, Style::default().fg(Color::Gray)),
        ])
    };

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
