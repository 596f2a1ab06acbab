//! dash-server: code checker and trading dashboard backend.
//!
//! Usage:
//!   dash-server [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>         Config file path (default: config/server.toml)
//!   -p, --port <PORT>           HTTP port (overrides config)
//!   --ws-port <PORT>            WebSocket push port (overrides config)
//!   --snapshot-dir <DIR>        Candle snapshot directory (overrides config)
//!   --clickhouse-url <URL>      ClickHouse HTTP URL (overrides config)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dash_checker::CheckerState;
use dash_common::ClickHouseClient;
use dash_market::{
    ClickHouseBarSink, IngestState, LocalRecorder, MarketBridge, SnapshotStore,
    spawn_market_bridge, spawn_push_server,
};
use dash_server::{ServerConfig, build_app};

/// CLI arguments for dash-server.
#[derive(Parser, Debug)]
#[command(name = "dash-server")]
#[command(about = "Code checker and trading dashboard backend")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/server.toml")]
    config: PathBuf,

    /// HTTP port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// WebSocket push port (overrides config file)
    #[arg(long)]
    ws_port: Option<u16>,

    /// Candle snapshot directory (overrides config file)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// ClickHouse HTTP URL (overrides config file)
    #[arg(long)]
    clickhouse_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal.
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args = Args::parse();

    let config_found = args.config.exists();
    let mut config = if config_found {
        ServerConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        ServerConfig::default()
    };

    config.apply_env_overrides();
    config.apply_cli_overrides(args.port, args.ws_port, args.snapshot_dir, args.clickhouse_url);

    init_tracing(&config.log_level)?;

    if !config_found {
        warn!("Config file not found at {:?}, using defaults", args.config);
    }

    config.validate().context("Configuration validation failed")?;

    info!(
        http = %config.http_addr(),
        ws_port = config.websocket.port,
        snapshot_dir = %config.market.snapshot_dir.display(),
        "Starting dash-server"
    );
    if config.checker.current_user.is_none() {
        warn!("No current_user configured; checker requests will redirect to the login page");
    }

    let clickhouse = if config.market.persist_bars {
        connect_clickhouse(&config).await
    } else {
        None
    };

    // Engine events -> bridge -> envelopes -> WebSocket clients
    let capacity = config.market.channel_capacity;
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (envelope_tx, envelope_rx) = mpsc::channel(capacity);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let (ws_server, ws_handle) = spawn_push_server(config.push_server_config(), envelope_rx);

    let mut bridge = MarketBridge::new(
        LocalRecorder::new(),
        SnapshotStore::new(&config.market.snapshot_dir),
        envelope_tx,
    );
    if let Some(client) = clickhouse {
        bridge = bridge.with_bar_sink(Arc::new(ClickHouseBarSink::new(client)));
    }
    let bridge_stats = bridge.stats_handle();
    let bridge_handle = spawn_market_bridge(bridge, event_rx, shutdown_tx.subscribe());

    let store = config.session_store();
    info!(temp_dir = %store.temp_dir().display(), "Checker session files");
    let checker = CheckerState::new(
        store.clone(),
        config.analyzer_config(),
        config.checker.interpreter.clone(),
        config.run_throttle(),
        config.checker.current_user.clone(),
    );

    let app = build_app(
        Arc::new(checker),
        IngestState::new(event_tx, bridge_stats),
        &config.http,
    );

    let listener = tokio::net::TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", config.http_addr()))?;
    info!(addr = %config.http_addr(), "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = wait_for_shutdown().await {
                error!("Shutdown signal handler error: {}", e);
            }
        })
        .await
        .context("HTTP server failed")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(());
    let _ = ws_server.shutdown_handle().send(());

    if let Err(e) = bridge_handle.await {
        warn!(error = %e, "Market bridge task failed");
    }
    match ws_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "WebSocket server exited with error"),
        Err(e) => warn!(error = %e, "WebSocket server task failed"),
    }

    let purged = store.purge();
    info!(purged, "Removed checker session files");

    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) -> Result<()> {
    let filter = log_filter(level);
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to set global tracing subscriber")
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Connect to ClickHouse and create tables; `None` when it is unreachable.
async fn connect_clickhouse(config: &ServerConfig) -> Option<ClickHouseClient> {
    let client = ClickHouseClient::new(config.clickhouse.clone());

    info!(url = %config.clickhouse.url, "Testing ClickHouse connection...");
    match client.ping().await {
        Ok(()) => {
            info!("ClickHouse connection successful");
            if let Err(e) = client.create_tables().await {
                warn!("Failed to create tables: {}", e);
            }
            Some(client)
        }
        Err(e) => {
            warn!("ClickHouse not available: {}. Bars will not be persisted.", e);
            None
        }
    }
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_log_filter_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(log_filter("DEBUG").to_string(), "debug");
        assert_eq!(log_filter("dash=verbose").to_string(), "info");
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "dash-server",
            "--config",
            "custom.toml",
            "--port",
            "8080",
            "--ws-port",
            "8081",
            "--snapshot-dir",
            "/tmp/snap",
            "--clickhouse-url",
            "http://db:8123",
        ]);
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.ws_port, Some(8081));
        assert_eq!(args.snapshot_dir, Some(PathBuf::from("/tmp/snap")));
        assert_eq!(args.clickhouse_url.as_deref(), Some("http://db:8123"));
    }
}
