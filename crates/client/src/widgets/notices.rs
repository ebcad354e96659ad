use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use loghell_core::notice::NoticeBoard;

use super::terminal_safe;

/// Stack of error notices pinned to the bottom of `area`, oldest on top.
pub fn render_notices(frame: &mut Frame, area: Rect, notices: &NoticeBoard) {
    if notices.is_empty() || area.height < 3 || area.width < 4 {
        return;
    }

    // +2 for borders
    let max_rows = (area.height / 2).max(1);
    let rows = (notices.len() as u16).min(max_rows);
    let height = rows + 2;
    let overlay = Rect {
        x: area.x + 1,
        y: area.y + area.height - height,
        width: area.width - 2,
        height,
    };

    let lines: Vec<Line> = notices
        .iter()
        .skip(notices.len() - rows as usize)
        .map(|notice| {
            Line::from(Span::styled(
                terminal_safe(&notice.message),
                Style::default().fg(Color::White),
            ))
        })
        .collect();

    frame.render_widget(Clear, overlay);
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(ratatui::widgets::BorderType::Rounded)
                .border_style(Style::default().fg(Color::Red))
                .title(Span::styled(" ERROR ", Style::default().fg(Color::Red).bold()))
                .style(Style::default().bg(Color::Rgb(50, 20, 20))),
        );
    frame.render_widget(popup, overlay);
}
