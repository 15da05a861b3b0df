use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rep_tracker::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rep_tracker::http::{run_http_server, AppState};
use rep_tracker::{init_logging, telemetry, FrameProcessor};

#[derive(Parser, Debug)]
#[command(name = "rep_server", about = "HTTP rep counting and calorie service")]
struct Cli {
    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Bind address, overriding `server.addr` from the config
    #[arg(long)]
    addr: Option<SocketAddr>,
    /// Calorie model artifact, overriding `calories.model_path`
    #[arg(long)]
    model: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match serve(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("rep_server error: {err:?}");
            eprintln!("rep_server error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn serve(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_from_file(&cli.config);
    if let Some(model) = cli.model {
        config.calories.model_path = Some(model);
    }
    let addr = match cli.addr {
        Some(addr) => addr,
        None => config
            .server
            .addr
            .parse()
            .with_context(|| format!("invalid server.addr '{}'", config.server.addr))?,
    };

    if !telemetry::init(&config.telemetry) {
        log::warn!("[Telemetry] Hub already initialized; keeping existing sizing");
    }
    let processor =
        FrameProcessor::from_config(&config).context("loading calorie model artifact")?;
    let state = AppState::new(Arc::new(processor), config.profile);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rep-server")
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run_http_server(state, addr, shutdown_signal()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("[Server] Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("[Server] Shutdown requested");
}
