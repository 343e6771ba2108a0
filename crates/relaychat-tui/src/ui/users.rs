//! Users sidebar
//!
//! Displays the relay's presence list.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use relaychat_app::App;

const USER_BULLET: &str = "• ";

/// Render the users sidebar.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let presence = app.presence();

    let items: Vec<ListItem> = if presence.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No users online",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        presence
            .users()
            .iter()
            .map(|user| {
                let style = if user == app.identity().username() {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::raw(USER_BULLET),
                    Span::styled(user.clone(), style),
                ]))
            })
            .collect()
    };

    let block = Block::default().borders(Borders::ALL).title(" Active Users ");
    let list = List::new(items).block(block);

    frame.render_widget(list, area);
}
