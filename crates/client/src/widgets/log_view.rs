use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Padding, Paragraph};

use loghell_core::buffer::{LogItem, RenderBuffer};
use loghell_core::transport::ChannelState;

use super::terminal_safe;

fn item_line(item: &LogItem) -> Line<'_> {
    let text = terminal_safe(&item.text);
    if item.is_new {
        Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Green)),
            Span::styled(
                text,
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Rgb(30, 50, 30))
                    .bold(),
            ),
        ])
    } else {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(text, Style::default().fg(Color::Gray)),
        ])
    }
}

fn state_color(state: ChannelState) -> Color {
    match state {
        ChannelState::Open => Color::Green,
        ChannelState::Connecting | ChannelState::Closing => Color::Yellow,
        ChannelState::Idle | ChannelState::Closed => Color::DarkGray,
    }
}

/// Newest line on top. Lines that do not fit are cut at the bottom.
pub fn render_log_view(
    frame: &mut Frame,
    area: Rect,
    buffer: &RenderBuffer,
    state: ChannelState,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 60, 60)))
        .padding(Padding::new(1, 1, 0, 0))
        .title(Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled("LOGS", Style::default().fg(Color::Yellow).bold()),
            Span::styled(
                format!(" {}/{} ", buffer.len(), buffer.capacity()),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", state),
            Style::default().fg(state_color(state)),
        )));

    if buffer.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "waiting for log lines",
            Style::default().fg(Color::DarkGray).italic(),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let lines: Vec<Line> = buffer.iter().map(item_line).collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
