mod app;
mod event;
mod plain;
mod rule_input;
mod tui;
mod widgets;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loghell_core::config::{self, ViewerConfig};
use loghell_core::transport::ChannelState;
use loghell_core::viewer::{Timings, Viewer};
use loghell_transport::WsConnector;

use app::App;
use event::{Event, EventHandler};

const DEFAULT_LOG_FILTER: &str = "loghell_client=debug,loghell_core=debug,loghell_transport=debug";

/// Time allowed for the close handshake after the user quits.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "loghell-tail", about = "Live tail of a loghell log stream")]
struct Cli {
    #[arg(long, help = "Log stream server host")]
    host: Option<String>,

    #[arg(short, long, help = "Log stream server port")]
    port: Option<u16>,

    #[arg(short, long, help = "Filter rule sent to the server; subscribes on launch")]
    rule: Option<String>,

    #[arg(long, help = "Path to config file (default: ~/.config/loghell/config.toml)")]
    config: Option<String>,

    #[arg(long)]
    tick_rate: Option<u64>,

    #[arg(long, help = "Print lines to stdout instead of the terminal UI")]
    plain: bool,

    #[arg(short = 'n', long, help = "Ring the terminal bell for every line (plain mode)")]
    bell: bool,
}

impl Cli {
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(host) = &self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.view.tick_rate_ms = tick_rate;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Daily rolling logs under the config dir; the terminal belongs to the UI
    let log_dir = config::log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "tail.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    // Load config: --config flag > default platform path
    let mut config = match &cli.config {
        Some(path) => config::load_config(path),
        None => config::load_or_create_config(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let rule = cli
        .rule
        .clone()
        .unwrap_or_else(|| config.default_rule.clone());
    info!(
        "Starting loghell-tail against {}:{}",
        config.endpoint.host, config.endpoint.port
    );

    let connector = WsConnector::new()?.with_connect_timeout(config.view.connect_timeout());
    if cli.plain {
        return plain::run(connector, config.endpoint.clone(), &rule, cli.bell).await;
    }

    let (transport_tx, transport_rx) = mpsc::unbounded_channel();
    let viewer = Viewer::new(
        connector,
        config.endpoint.clone(),
        transport_tx,
        config.view.max_elements,
        Timings::from(&config.view),
    );
    let mut app = App::new(viewer, &rule);
    if cli.rule.is_some() {
        app.start();
    }

    let mut events = EventHandler::new(config.view.tick_rate_ms, transport_rx);
    let mut terminal = tui::init()?;

    // Main loop
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Some(event) = events.next().await {
            app.update(event);
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while app.viewer.state() == ChannelState::Closing {
            match events.next().await {
                Some(event @ Event::Transport(_)) => app.update(event),
                Some(_) => {}
                None => break,
            }
        }
    })
    .await;

    tui::restore()?;
    info!("loghell-tail shutdown complete");

    Ok(())
}
