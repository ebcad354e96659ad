use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use loghell_core::transport::{
    ChannelEvent, CloseFrame, ConnectionId, Connector, EventSender, Link, TransportEvent,
    CLOSE_ABNORMAL,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the server to acknowledge our close frame.
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on TCP connect plus WebSocket upgrade.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Opens one WebSocket per `open` call, each driven by its own task.
pub struct WsConnector {
    runtime: Handle,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("WebSocket connector needs a tokio runtime: {}", e))?;
        Ok(Self {
            runtime,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Connector for WsConnector {
    fn open(&mut self, id: ConnectionId, url: &str, events: EventSender) -> Box<dyn Link> {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = drive(id, url.to_string(), self.connect_timeout, events, control_rx);
        self.runtime.spawn(task);
        Box::new(WsLink {
            id,
            control: control_tx,
        })
    }
}

/// Close handle for a connection task. Dropping it closes the socket
/// with "going away".
pub struct WsLink {
    id: ConnectionId,
    control: mpsc::UnboundedSender<CloseFrame>,
}

impl Link for WsLink {
    fn close(&mut self, frame: CloseFrame) {
        if self.control.send(frame).is_err() {
            debug!("Connection {} already finished", self.id);
        }
    }
}

async fn drive(
    id: ConnectionId,
    url: String,
    connect_timeout: Duration,
    events: EventSender,
    mut control: mpsc::UnboundedReceiver<CloseFrame>,
) {
    let emit = |event: TransportEvent| {
        // receiver gone means the app is shutting down
        let _ = events.send(ChannelEvent::new(id, event));
    };

    let handshake =
        tokio::time::timeout(connect_timeout, tokio_tungstenite::connect_async(url.as_str()));
    let connected = tokio::select! {
        res = handshake => res,
        frame = control.recv() => {
            let frame = frame.unwrap_or_else(CloseFrame::navigated_away);
            debug!("Connection {} closed before handshake finished", id);
            emit(TransportEvent::Closed { code: Some(frame.code), reason: frame.reason });
            return;
        }
    };

    let mut ws = match connected {
        Ok(Ok((ws, _))) => ws,
        Err(_) => {
            warn!("WebSocket connect to {} timed out", url);
            emit(TransportEvent::Error(format!(
                "connect timed out after {}ms",
                connect_timeout.as_millis()
            )));
            return;
        }
        Ok(Err(e)) => {
            warn!("WebSocket connect to {} failed: {}", url, e);
            emit(TransportEvent::Error(e.to_string()));
            return;
        }
    };
    info!("WebSocket connected to {} as {}", url, id);
    emit(TransportEvent::Opened);

    loop {
        tokio::select! {
            frame = control.recv() => {
                let frame = frame.unwrap_or_else(CloseFrame::navigated_away);
                close_gracefully(&mut ws, &frame).await;
                info!("WebSocket {} closed by client (code {})", id, frame.code);
                emit(TransportEvent::Closed { code: Some(frame.code), reason: frame.reason });
                return;
            }
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!("WS {} received {} binary bytes", id, data.len());
                    emit(TransportEvent::Message(String::from_utf8_lossy(&data).into_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                        None => (None, String::new()),
                    };
                    info!(
                        "WebSocket {} closed by server (code {:?}, reason {:?})",
                        id, code, reason
                    );
                    emit(TransportEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WS error on {}: {}", id, e);
                    emit(TransportEvent::Error(e.to_string()));
                    return;
                }
                None => {
                    emit(TransportEvent::Closed {
                        code: Some(CLOSE_ABNORMAL),
                        reason: String::new(),
                    });
                    return;
                }
            }
        }
    }
}

async fn close_gracefully(ws: &mut WsStream, frame: &CloseFrame) {
    let close = WsCloseFrame {
        code: CloseCode::from(frame.code),
        reason: frame.reason.clone().into(),
    };
    if let Err(e) = ws.close(Some(close)).await {
        debug!("WS close send failed: {}", e);
        return;
    }

    let drain = async { while let Some(Ok(_)) = ws.next().await {} };
    if tokio::time::timeout(CLOSE_ACK_TIMEOUT, drain).await.is_err() {
        debug!("Server did not acknowledge close within {:?}", CLOSE_ACK_TIMEOUT);
    }
}
