use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tracing::{debug, info};

use loghell_core::transport::{ChannelState, Connector};
use loghell_core::viewer::Viewer;

use crate::event::Event;
use crate::rule_input::RuleInput;
use crate::widgets::log_view::render_log_view;
use crate::widgets::notices::render_notices;
use crate::widgets::rule_bar::render_rule_bar;

pub struct App<C: Connector> {
    pub viewer: Viewer<C>,
    pub rule_input: RuleInput,
    pub should_quit: bool,
}

impl<C: Connector> App<C> {
    pub fn new(viewer: Viewer<C>, initial_rule: &str) -> Self {
        Self {
            viewer,
            rule_input: RuleInput::new(initial_rule),
            should_quit: false,
        }
    }

    pub fn update(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            // ratatui picks up the new size on the next draw
            Event::Resize(w, h) => debug!("Terminal resized to {}x{}", w, h),
            Event::Tick => {
                let fired = self.viewer.tick(Instant::now());
                if fired > 0 {
                    debug!("{} transient updates applied", fired);
                }
            }
            Event::Transport(event) => self.viewer.on_event(event, Instant::now()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            KeyCode::Esc => self.quit(),
            KeyCode::Enter => self.start(),
            KeyCode::Backspace => self.rule_input.delete_char(),
            KeyCode::Delete => self.rule_input.delete_forward(),
            KeyCode::Left => self.rule_input.move_left(),
            KeyCode::Right => self.rule_input.move_right(),
            KeyCode::Home => self.rule_input.home(),
            KeyCode::End => self.rule_input.end(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.rule_input.clear()
            }
            KeyCode::Char(c) => self.rule_input.insert_char(c),
            _ => {}
        }
    }

    /// Subscribe with whatever rule is in the input right now.
    pub fn start(&mut self) {
        let rule = self.rule_input.value().to_string();
        self.viewer.start(&rule);
    }

    fn quit(&mut self) {
        info!("Quit requested");
        self.should_quit = true;
    }

    /// Close the stream without raising a notice.
    pub fn shutdown(&mut self) {
        self.viewer.teardown();
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1), // status bar
            Constraint::Length(1), // rule input
        ])
        .split(frame.area());

        render_log_view(frame, chunks[0], self.viewer.buffer(), self.viewer.state());
        render_notices(frame, chunks[0], self.viewer.notices());
        self.render_status_bar(frame, chunks[1]);
        render_rule_bar(frame, chunks[2], &self.rule_input);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let state = self.viewer.state();
        let (label, color) = match state {
            ChannelState::Open => ("LIVE", Color::Green),
            ChannelState::Connecting => ("CONNECTING", Color::Yellow),
            ChannelState::Closing => ("CLOSING", Color::Yellow),
            ChannelState::Idle => ("IDLE", Color::Cyan),
            ChannelState::Closed => ("CLOSED", Color::Red),
        };

        let endpoint = self.viewer.endpoint();
        let mut spans = vec![
            Span::styled(
                format!(" {} ", label),
                Style::default().fg(Color::Black).bg(color).bold(),
            ),
            Span::styled(
                format!(" {}:{} ", endpoint.host, endpoint.port),
                Style::default().fg(Color::White).bg(Color::Rgb(40, 40, 40)),
            ),
        ];

        if let Some(rule) = self.viewer.rule() {
            spans.push(Span::styled(
                format!(" rule {} ", rule),
                Style::default().fg(Color::DarkGray),
            ));
        }

        spans.push(Span::styled(
            "  Enter subscribe · Esc quit",
            Style::default().fg(Color::DarkGray),
        ));

        let bar = Paragraph::new(Line::from(spans))
            .style(Style::default().bg(Color::Rgb(20, 20, 20)));
        frame.render_widget(bar, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use loghell_core::transport::{
        ChannelEvent, CloseFrame, ConnectionId, Endpoint, EventSender, Link, TransportEvent,
    };
    use loghell_core::viewer::Timings;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingConnector {
        urls: Arc<Mutex<Vec<String>>>,
        closes: Arc<Mutex<Vec<(ConnectionId, CloseFrame)>>>,
    }

    struct RecordingLink {
        id: ConnectionId,
        closes: Arc<Mutex<Vec<(ConnectionId, CloseFrame)>>>,
    }

    impl Connector for RecordingConnector {
        fn open(&mut self, id: ConnectionId, url: &str, _events: EventSender) -> Box<dyn Link> {
            self.urls.lock().unwrap().push(url.to_string());
            Box::new(RecordingLink {
                id,
                closes: self.closes.clone(),
            })
        }
    }

    impl Link for RecordingLink {
        fn close(&mut self, frame: CloseFrame) {
            self.closes.lock().unwrap().push((self.id, frame));
        }
    }

    fn app(rule: &str) -> (App<RecordingConnector>, RecordingConnector) {
        let connector = RecordingConnector::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let viewer = Viewer::new(
            connector.clone(),
            Endpoint::new("127.0.0.1", 3032),
            tx,
            25,
            Timings::default(),
        );
        (App::new(viewer, rule), connector)
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_enter_subscribes_with_typed_rule() {
        let (mut app, connector) = app("");
        for c in "level=error".chars() {
            app.update(press(KeyCode::Char(c)));
        }
        app.update(press(KeyCode::Enter));

        assert_eq!(
            connector.urls.lock().unwrap().as_slice(),
            ["ws://127.0.0.1:3032/?rule=level=error".to_string()]
        );
        assert_eq!(app.viewer.state(), ChannelState::Connecting);
    }

    #[test]
    fn test_transport_events_reach_buffer() {
        let (mut app, _) = app("r");
        app.update(press(KeyCode::Enter));
        let id = ConnectionId(1);
        app.update(Event::Transport(ChannelEvent::new(id, TransportEvent::Opened)));
        for line in ["a", "b", "c"] {
            app.update(Event::Transport(ChannelEvent::new(
                id,
                TransportEvent::Message(line.to_string()),
            )));
        }

        let lines: Vec<&str> = app.viewer.buffer().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(lines, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_esc_quits_and_shutdown_closes_quietly() {
        let (mut app, connector) = app("r");
        app.update(press(KeyCode::Enter));
        app.update(Event::Transport(ChannelEvent::new(
            ConnectionId(1),
            TransportEvent::Opened,
        )));

        app.update(press(KeyCode::Esc));
        assert!(app.should_quit);

        app.shutdown();
        app.update(Event::Transport(ChannelEvent::new(
            ConnectionId(1),
            TransportEvent::Closed {
                code: Some(1001),
                reason: String::new(),
            },
        )));
        assert!(app.viewer.notices().is_empty());
        assert_eq!(
            connector.closes.lock().unwrap().last(),
            Some(&(ConnectionId(1), CloseFrame::navigated_away()))
        );
    }

    #[test]
    fn test_key_release_is_ignored() {
        let (mut app, _) = app("");
        let mut key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        app.update(Event::Key(key));
        assert_eq!(app.rule_input.value(), "");
    }
}
