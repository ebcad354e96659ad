use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::buffer::RenderBuffer;
use crate::config::ViewConfig;
use crate::notice::NoticeBoard;
use crate::scheduler::{TaskKey, TransientScheduler, ERROR_TIMEOUT, NEW_LOG_TIMEOUT};
use crate::transport::{
    ChannelEvent, ChannelState, CloseFrame, ConnectionId, Connector, Endpoint, EventSender,
    Signal, TransportChannel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Highlight decay for new lines.
    pub highlight: Duration,
    /// Lifetime of an error notice.
    pub notice: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            highlight: NEW_LOG_TIMEOUT,
            notice: ERROR_TIMEOUT,
        }
    }
}

impl From<&ViewConfig> for Timings {
    fn from(view: &ViewConfig) -> Self {
        Self {
            highlight: view.new_log_timeout(),
            notice: view.error_timeout(),
        }
    }
}

/// Ties the transport channel to the render buffer and notices.
///
/// Every method runs to completion; callers feed transport events and
/// clock ticks in the order they happen.
pub struct Viewer<C: Connector> {
    channel: TransportChannel<C>,
    buffer: RenderBuffer,
    notices: NoticeBoard,
    scheduler: TransientScheduler,
    timings: Timings,
}

impl<C: Connector> Viewer<C> {
    pub fn new(
        connector: C,
        endpoint: Endpoint,
        events: EventSender,
        capacity: usize,
        timings: Timings,
    ) -> Self {
        Self {
            channel: TransportChannel::new(connector, endpoint, events),
            buffer: RenderBuffer::new(capacity),
            notices: NoticeBoard::new(),
            scheduler: TransientScheduler::new(),
            timings,
        }
    }

    /// Subscribe with `rule`, replacing any current connection without
    /// surfacing its close.
    pub fn start(&mut self, rule: &str) -> ConnectionId {
        self.channel.disconnect(None);
        let id = self.channel.connect(rule);
        info!("Started {} with rule {:?}", id, rule);
        id
    }

    pub fn on_event(&mut self, event: ChannelEvent, now: Instant) {
        match self.channel.handle(event) {
            Some(Signal::Line(text)) => {
                let inserted = self.buffer.insert(text, now);
                self.scheduler
                    .schedule_highlight_decay(inserted.seq, now, self.timings.highlight);
                if let Some(evicted) = inserted.evicted {
                    self.scheduler.cancel(&TaskKey::Highlight(evicted.seq));
                }
            }
            Some(Signal::Failure(reason)) => {
                let id = self.notices.show(&reason, now);
                self.scheduler
                    .schedule_notice_dismissal(id, now, self.timings.notice);
            }
            None => {}
        }
    }

    /// Run every deferred state change due at `now`. Returns how many fired.
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.scheduler.take_due(now);
        let fired = due.len();
        for key in due {
            let applied = match key {
                TaskKey::Highlight(seq) => self.buffer.mark_seen(seq),
                TaskKey::Dismiss(id) => self.notices.dismiss(id),
            };
            if !applied {
                debug!("Target of {:?} already gone", key);
            }
        }
        fired
    }

    /// Intentional exit: close without a notice and drop transient state.
    /// Pending highlight decays are cancelled, so highlights go with them.
    pub fn teardown(&mut self) {
        self.channel.disconnect(Some(CloseFrame::navigated_away()));
        self.notices.clear();
        self.scheduler.clear();
        self.buffer.mark_all_seen();
    }

    pub fn buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn rule(&self) -> Option<&str> {
        self.channel.rule()
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.channel.endpoint()
    }

    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::FALLBACK_REASON;
    use crate::tests_common::*;
    use crate::transport::TransportEvent;
    use tokio::sync::mpsc;

    fn viewer() -> (Viewer<FakeConnector>, FakeConnector) {
        let connector = FakeConnector::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let viewer = Viewer::new(
            connector.clone(),
            Endpoint::default(),
            tx,
            25,
            Timings::default(),
        );
        (viewer, connector)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn lines(v: &Viewer<FakeConnector>) -> Vec<String> {
        v.buffer().iter().map(|i| i.text.clone()).collect()
    }

    #[test]
    fn test_lines_render_newest_first() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("level=error");
        v.on_event(opened(id), t0);
        for line in ["a", "b", "c"] {
            v.on_event(message(id, line), t0);
        }
        assert_eq!(lines(&v), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_highlight_decays_after_timeout() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(message(id, "a"), t0);
        assert!(v.buffer().iter().next().unwrap().is_new);

        v.tick(t0 + ms(499));
        assert!(v.buffer().iter().next().unwrap().is_new);

        assert_eq!(v.tick(t0 + ms(500)), 1);
        assert!(!v.buffer().iter().next().unwrap().is_new);
    }

    #[test]
    fn test_eviction_cancels_pending_highlight() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(opened(id), t0);
        for n in 1..=30 {
            v.on_event(message(id, &format!("m{}", n)), t0);
        }

        let expected: Vec<String> = (6..=30).rev().map(|n| format!("m{}", n)).collect();
        assert_eq!(lines(&v), expected);

        // only the 25 surviving items still have a decay pending
        assert_eq!(v.tick(t0 + ms(500)), 25);
        assert!(v.buffer().iter().all(|item| !item.is_new));
    }

    #[test]
    fn test_server_close_with_empty_reason_shows_fallback_for_five_seconds() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(closed(id, ""), t0);

        let shown: Vec<&str> = v.notices().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(shown, vec![FALLBACK_REASON]);

        v.tick(t0 + ms(4999));
        assert_eq!(v.notices().len(), 1);
        v.tick(t0 + ms(5000));
        assert!(v.notices().is_empty());
        assert_eq!(v.state(), ChannelState::Closed);
    }

    #[test]
    fn test_transport_error_surfaces_notice() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(
            ChannelEvent::new(id, TransportEvent::Error("connection refused".into())),
            t0,
        );
        assert_eq!(
            v.notices().iter().next().map(|n| n.message.as_str()),
            Some("connection refused")
        );
    }

    #[test]
    fn test_restart_while_open_keeps_one_connection() {
        let (mut v, connector) = viewer();
        let t0 = Instant::now();
        let first = v.start("a");
        v.on_event(opened(first), t0);

        let second = v.start("b");
        // late acknowledgement of the first close
        v.on_event(closed(first, ""), t0);
        v.on_event(opened(second), t0);

        assert!(v.notices().is_empty());
        assert_eq!(v.state(), ChannelState::Open);
        assert_eq!(v.rule(), Some("b"));
        assert_eq!(connector.open_count(), 2);
    }

    #[test]
    fn test_double_start_before_any_message() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let first = v.start("level=error");
        let second = v.start("level=warn");

        v.on_event(message(first, "stale"), t0);
        v.on_event(closed(first, ""), t0);
        v.on_event(opened(second), t0);
        v.on_event(message(second, "fresh"), t0);

        assert!(v.notices().is_empty());
        assert_eq!(lines(&v), vec!["fresh"]);
    }

    #[test]
    fn test_teardown_is_silent() {
        let (mut v, connector) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(closed(id, "boom"), t0);
        assert_eq!(v.notices().len(), 1);

        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.teardown();
        v.on_event(closed(id, ""), t0);

        assert!(v.notices().is_empty());
        assert!(v.next_deadline().is_none());
        assert_eq!(
            connector.calls().last(),
            Some(&Call::Close {
                id,
                frame: CloseFrame::navigated_away()
            })
        );
    }

    #[test]
    fn test_restart_after_teardown_has_no_stale_highlights() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(message(id, "one"), t0);
        v.on_event(message(id, "two"), t0);
        assert!(v.buffer().iter().all(|item| item.is_new));

        v.teardown();
        v.on_event(closed(id, ""), t0);
        assert!(v.buffer().iter().all(|item| !item.is_new));

        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(message(id, "three"), t0);
        let fresh: Vec<&str> = v
            .buffer()
            .iter()
            .filter(|item| item.is_new)
            .map(|item| item.text.as_str())
            .collect();
        assert_eq!(fresh, vec!["three"]);

        v.tick(t0 + Duration::from_secs(1));
        assert!(v.buffer().iter().all(|item| !item.is_new));
    }

    #[test]
    fn test_can_start_again_after_failure() {
        let (mut v, _) = viewer();
        let t0 = Instant::now();
        let id = v.start("r");
        v.on_event(ChannelEvent::new(id, TransportEvent::Error(String::new())), t0);
        assert_eq!(v.state(), ChannelState::Closed);

        let id = v.start("r");
        v.on_event(opened(id), t0);
        v.on_event(message(id, "back"), t0);
        assert_eq!(lines(&v), vec!["back"]);
    }
}
