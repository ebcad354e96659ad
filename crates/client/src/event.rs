use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent};
use futures::StreamExt;
use tokio::sync::mpsc;

use loghell_core::transport::ChannelEvent;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    /// Event from the log stream connection.
    Transport(ChannelEvent),
}

/// Merges terminal input, clock ticks and transport events into one
/// ordered queue. The app handles one event at a time.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64, transport_rx: mpsc::UnboundedReceiver<ChannelEvent>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::event_loop(tx, tick_rate_ms, transport_rx));

        Self { rx, _task: task }
    }

    async fn event_loop(
        tx: mpsc::UnboundedSender<Event>,
        tick_rate_ms: u64,
        mut transport_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    ) {
        let mut reader = EventStream::new();
        let mut tick = tokio::time::interval(Duration::from_millis(tick_rate_ms.max(1)));

        loop {
            let event = tokio::select! {
                maybe_event = reader.next() => match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                    Some(_) => continue,
                    None => break,
                },
                _ = tick.tick() => Event::Tick,
                Some(transport_event) = transport_rx.recv() => Event::Transport(transport_event),
            };

            if tx.send(event).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
