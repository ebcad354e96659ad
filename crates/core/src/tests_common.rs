use std::sync::{Arc, Mutex};

use crate::transport::{
    ChannelEvent, CloseFrame, ConnectionId, Connector, EventSender, Link, TransportEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open { id: ConnectionId, url: String },
    Close { id: ConnectionId, frame: CloseFrame },
}

/// Connector that records every open/close instead of touching the network.
#[derive(Clone, Default)]
pub struct FakeConnector {
    log: Arc<Mutex<Vec<Call>>>,
}

impl FakeConnector {
    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Open { .. }))
            .count()
    }
}

impl Connector for FakeConnector {
    fn open(&mut self, id: ConnectionId, url: &str, _events: EventSender) -> Box<dyn Link> {
        self.log.lock().unwrap().push(Call::Open {
            id,
            url: url.to_string(),
        });
        Box::new(FakeLink {
            id,
            log: self.log.clone(),
        })
    }
}

struct FakeLink {
    id: ConnectionId,
    log: Arc<Mutex<Vec<Call>>>,
}

impl Link for FakeLink {
    fn close(&mut self, frame: CloseFrame) {
        self.log.lock().unwrap().push(Call::Close { id: self.id, frame });
    }
}

pub fn opened(id: ConnectionId) -> ChannelEvent {
    ChannelEvent::new(id, TransportEvent::Opened)
}

pub fn message(id: ConnectionId, text: &str) -> ChannelEvent {
    ChannelEvent::new(id, TransportEvent::Message(text.to_string()))
}

pub fn closed(id: ConnectionId, reason: &str) -> ChannelEvent {
    ChannelEvent::new(
        id,
        TransportEvent::Closed {
            code: Some(1000),
            reason: reason.to_string(),
        },
    )
}
