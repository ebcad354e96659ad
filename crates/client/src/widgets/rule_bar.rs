use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::rule_input::RuleInput;

const PROMPT: &str = "rule ";

pub fn render_rule_bar(frame: &mut Frame, area: Rect, input: &RuleInput) {
    let mut spans = vec![Span::styled(
        PROMPT,
        Style::default().fg(Color::Magenta).bold(),
    )];
    if input.value().is_empty() {
        spans.push(Span::styled(
            "type a rule, Enter to subscribe",
            Style::default().fg(Color::DarkGray).italic(),
        ));
    } else {
        spans.push(Span::styled(input.value(), Style::default().fg(Color::White)));
    }

    let bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Rgb(25, 25, 25)));
    frame.render_widget(bar, area);

    frame.set_cursor_position((
        area.x + (PROMPT.len() + input.cursor_column()) as u16,
        area.y,
    ));
}
