//! Chat area
//!
//! Displays the visible conversation, oldest at the top. Own messages are
//! right-aligned, relay notices centered, everyone else left-aligned.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use relaychat_app::{App, Ownership};
use relaychat_proto::ChatMessage;

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render<I>(frame: &mut Frame, app: &App<I>, area: Rect) {
    let title = format!(" Chat – {} ", app.identity().username());
    let block = Block::default().borders(Borders::ALL).title(title);

    let messages = app.scrolled_messages();
    let lines: Vec<Line> = if messages.is_empty() {
        vec![Line::styled("No messages yet", Style::default().fg(Color::DarkGray))]
    } else {
        messages.into_iter().map(|msg| message_line(msg, app.ownership(msg))).collect()
    };

    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let skip = lines.len().saturating_sub(visible_height);
    let visible_lines: Vec<_> = lines.into_iter().skip(skip).collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}

fn message_line(msg: &ChatMessage, ownership: Ownership) -> Line<'static> {
    let time = msg.sent_at.map(|sent_at| time_label(&sent_at, &Local));
    let time_span =
        |time: String| Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray));

    let mut spans = match ownership {
        Ownership::System => vec![Span::styled(
            msg.text.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )],
        Ownership::Mine => vec![Span::styled(msg.text.clone(), Style::default().fg(Color::Cyan))],
        Ownership::Other => vec![
            Span::styled(
                format!("{}: ", msg.sender_username.as_deref().unwrap_or("?")),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(msg.text.clone()),
        ],
    };
    spans.extend(time.map(time_span));

    let alignment = match ownership {
        Ownership::System => Alignment::Center,
        Ownership::Mine => Alignment::Right,
        Ownership::Other => Alignment::Left,
    };
    Line::from(spans).alignment(alignment)
}

/// `HH:MM` of `sent_at` in `tz`.
pub fn time_label<Tz>(sent_at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    sent_at.with_timezone(tz).format("%H:%M").to_string()
}
