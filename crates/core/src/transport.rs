use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::notice::reason_or_fallback;

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Endpoint is going away (client navigated away or shut down).
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// No close frame was received.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Lifecycle of the single streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ChannelState {
    /// Whether a connection in this state counts as live.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Identity of one `connect` call. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw event produced by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed { code: Option<u16>, reason: String },
    Error(String),
}

/// A transport event tagged with the connection that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub conn: ConnectionId,
    pub event: TransportEvent,
}

impl ChannelEvent {
    pub fn new(conn: ConnectionId, event: TransportEvent) -> Self {
        Self { conn, event }
    }
}

pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;

/// Status code and reason sent when the client closes on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

impl CloseFrame {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Sent on application teardown.
    pub fn navigated_away() -> Self {
        Self::new(CLOSE_GOING_AWAY, "loghell dashboard shutdown")
    }
}

impl Default for CloseFrame {
    fn default() -> Self {
        Self::new(CLOSE_NORMAL, "loghell client closed")
    }
}

/// Opens streaming connections. Implementations must not block: the
/// outcome of `open` is reported later through `events`.
pub trait Connector: Send {
    fn open(&mut self, id: ConnectionId, url: &str, events: EventSender) -> Box<dyn Link>;
}

/// Handle to one open (or opening) connection.
pub trait Link: Send {
    /// Begin closing. Completion arrives as `TransportEvent::Closed`.
    fn close(&mut self, frame: CloseFrame);
}

/// Fixed host plus configurable port of the log stream server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Connection target for `rule`. The rule is forwarded verbatim; the
    /// server owns parsing and validation.
    pub fn stream_url(&self, rule: &str) -> String {
        format!("ws://{}:{}/?rule={}", self.host, self.port, rule)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("127.0.0.1", 3032)
    }
}

/// What the controller needs to act on after a transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// One log line arrived on the live connection.
    Line(String),
    /// The live connection failed or was closed by the server.
    Failure(String),
}

struct Connection {
    id: ConnectionId,
    rule: String,
    state: ChannelState,
    link: Option<Box<dyn Link>>,
    expected_close: bool,
}

impl Connection {
    fn finish(&mut self) {
        self.state = ChannelState::Closed;
        self.link = None;
        self.expected_close = false;
    }
}

/// Owns at most one connection at a time and turns raw transport events
/// into [`Signal`]s.
pub struct TransportChannel<C: Connector> {
    connector: C,
    endpoint: Endpoint,
    events: EventSender,
    live: Option<Connection>,
    next_id: u64,
}

impl<C: Connector> TransportChannel<C> {
    pub fn new(connector: C, endpoint: Endpoint, events: EventSender) -> Self {
        Self {
            connector,
            endpoint,
            events,
            live: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.live
            .as_ref()
            .map_or(ChannelState::Idle, |conn| conn.state)
    }

    pub fn current(&self) -> Option<ConnectionId> {
        self.live.as_ref().map(|conn| conn.id)
    }

    pub fn rule(&self) -> Option<&str> {
        self.live.as_ref().map(|conn| conn.rule.as_str())
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// Open a fresh connection for `rule`. A previous connection that is
    /// not yet closed is closed silently first.
    pub fn connect(&mut self, rule: &str) -> ConnectionId {
        self.disconnect(None);
        if let Some(mut prev) = self.live.take() {
            if prev.state != ChannelState::Closed {
                debug!("Retiring connection {} while {}", prev.id, prev.state);
                prev.finish();
            }
        }

        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        let url = self.endpoint.stream_url(rule);
        info!("Connecting {} to {}", id, url);
        let link = self.connector.open(id, &url, self.events.clone());

        self.live = Some(Connection {
            id,
            rule: rule.to_string(),
            state: ChannelState::Connecting,
            link: Some(link),
            expected_close: false,
        });
        id
    }

    /// Close the current connection on purpose. Its close event will not
    /// surface as a failure. No-op when nothing is open.
    pub fn disconnect(&mut self, frame: Option<CloseFrame>) {
        let Some(conn) = self.live.as_mut() else {
            return;
        };
        if !conn.state.is_live() {
            return;
        }

        let frame = frame.unwrap_or_default();
        info!(
            "Disconnecting {} (code {}, reason {:?})",
            conn.id, frame.code, frame.reason
        );
        conn.expected_close = true;
        if let Some(link) = conn.link.as_mut() {
            link.close(frame);
        }
        conn.state = ChannelState::Closing;
    }

    /// Apply one transport event. Events from connections other than the
    /// current one are ignored.
    pub fn handle(&mut self, event: ChannelEvent) -> Option<Signal> {
        let Some(conn) = self.live.as_mut().filter(|conn| conn.id == event.conn) else {
            debug!("Ignoring stale event from {}: {:?}", event.conn, event.event);
            return None;
        };

        match event.event {
            TransportEvent::Opened => {
                if conn.state == ChannelState::Connecting {
                    conn.state = ChannelState::Open;
                    info!("Connection {} open (rule {:?})", conn.id, conn.rule);
                }
                None
            }
            TransportEvent::Message(text) => {
                if conn.state == ChannelState::Open {
                    Some(Signal::Line(text))
                } else {
                    debug!("Dropping frame on {} while {}", conn.id, conn.state);
                    None
                }
            }
            TransportEvent::Closed { code, reason } => {
                if conn.state == ChannelState::Closed {
                    return None;
                }
                let expected = conn.expected_close;
                conn.finish();
                if expected {
                    info!("Connection {} closed (code {:?})", conn.id, code);
                    None
                } else {
                    warn!(
                        "Connection {} closed by server (code {:?}, reason {:?})",
                        conn.id, code, reason
                    );
                    Some(Signal::Failure(reason_or_fallback(&reason)))
                }
            }
            TransportEvent::Error(info) => {
                if conn.state == ChannelState::Closed {
                    return None;
                }
                let expected = conn.expected_close;
                conn.finish();
                if expected {
                    debug!("Error while closing {}: {}", conn.id, info);
                    None
                } else {
                    warn!("Transport error on {}: {}", conn.id, info);
                    Some(Signal::Failure(reason_or_fallback(&info)))
                }
            }
        }
    }
}
