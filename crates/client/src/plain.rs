use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use loghell_core::transport::{ChannelState, CloseFrame, Endpoint, Signal, TransportChannel};
use loghell_transport::WsConnector;

/// How long to wait for the server to acknowledge our close on Ctrl+C.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Stream lines to stdout without a TUI. With `bell`, each line is
/// preceded by BEL so the terminal can notify.
pub async fn run(
    connector: WsConnector,
    endpoint: Endpoint,
    rule: &str,
    bell: bool,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = TransportChannel::new(connector, endpoint, tx);
    channel.connect(rule);

    let prefix = if bell { "\x07" } else { "" };
    let stdout = std::io::stdout();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, closing stream");
                channel.disconnect(Some(CloseFrame::navigated_away()));
                let _ = tokio::time::timeout(CLOSE_GRACE, async {
                    while channel.state() == ChannelState::Closing {
                        match rx.recv().await {
                            Some(event) => {
                                channel.handle(event);
                            }
                            None => break,
                        }
                    }
                })
                .await;
                return Ok(());
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                match channel.handle(event) {
                    Some(Signal::Line(text)) => {
                        let mut out = stdout.lock();
                        writeln!(out, "{}{}", prefix, text)?;
                        out.flush()?;
                    }
                    Some(Signal::Failure(reason)) => {
                        anyhow::bail!("connection closed: {}", reason);
                    }
                    None => {}
                }
            }
        }
    }
}
