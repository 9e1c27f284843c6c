use std::sync::Arc;

use clap::Parser;
use nottif_client::{ActionClient, Backend};
use nottif_core::NottifConfig;
use nottif_dashboard::{ListStore, SyncController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod console;

use console::{parse_line, Input, TerminalNotifier, TerminalSurface, HELP};

#[derive(Parser)]
#[command(name = "nottif-console")]
#[command(about = "Terminal dashboard for a nottif notification backend")]
#[command(version)]
struct Cli {
    /// Configuration file (default: $NOTTIF_CONFIG, then ~/.nottif/nottif.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL, overrides server.base_url
    #[arg(long)]
    server: Option<String>,

    /// Skip the live event stream; the event log is refetched after each action
    #[arg(long)]
    no_stream: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is the dashboard, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nottif_console=info,nottif_dashboard=info,nottif_client=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // load config: --config > NOTTIF_CONFIG env > ~/.nottif/nottif.toml
    let config_path = cli.config.or_else(|| std::env::var("NOTTIF_CONFIG").ok());
    let mut config = NottifConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        NottifConfig::default()
    });
    if let Some(server) = cli.server {
        config.server.base_url = server;
        config.validate()?;
    }

    let client = ActionClient::new(&config.server)?;
    match client.health().await {
        Ok(()) => info!(url = %client.base_url(), "backend reachable"),
        Err(e) => warn!(url = %client.base_url(), error = %e, "backend health check failed"),
    }

    let store = ListStore::new(
        TerminalSurface,
        config.events.max_displayed,
        config.display.clock,
    );
    let mut controller = SyncController::new(Arc::new(client.clone()), store, TerminalNotifier);
    if cli.no_stream {
        info!("live stream disabled, event log refreshes after each action");
    } else {
        controller.connect(client.push_channel(config.events.payload));
    }
    controller.start();

    let handle = controller.handle();
    let sync = tokio::spawn(async move { controller.run().await });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(line) = line else {
            break; // stdin closed
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(Input::Help)) => println!("{HELP}"),
            Ok(Some(Input::Quit)) => break,
            Ok(Some(Input::Command(command))) => {
                if !handle.send(command).await {
                    break;
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    handle.shutdown().await;
    sync.await?;
    info!("nottif console stopped");
    Ok(())
}
