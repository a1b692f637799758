//! Deployhook entry point.
//!
//! This binary is the composition root:
//!
//! 1. **Parse arguments** and load the repository registry.
//! 2. **Wire observability**: `tracing-subscriber` console output plus an
//!    optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: [`store::JsonFileStatusStore`] and
//!    [`runner::ShellCommandRunner`], injected into [`coordinator::Deployer`].
//! 4. **Serve** until SIGINT or SIGTERM, then wait for in-flight deployments.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coordinator::Deployer;
use deploy::ExecutionMode;
use runner::ShellCommandRunner;
use store::JsonFileStatusStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::telemetry::LogFormat;

/// Runs deployment commands when signed push webhooks arrive.
#[derive(Debug, Parser)]
#[command(name = "deployhook", version, about)]
struct Args {
    /// Repository registry (JSON).
    #[arg(long, env = "DEPLOYHOOK_CONFIG", default_value = "deploy.config.json")]
    config: PathBuf,

    /// File the deployment status is persisted to.
    #[arg(long, env = "DEPLOYHOOK_STATE", default_value = "deploy.status.json")]
    state: PathBuf,

    /// Address to accept webhooks on.
    #[arg(long, env = "DEPLOYHOOK_LISTEN", default_value = "0.0.0.0:6061")]
    listen: SocketAddr,

    /// `sync` answers a webhook when its deployment finishes; `async` answers
    /// immediately with 202.
    #[arg(long, env = "DEPLOYHOOK_MODE", default_value_t = ExecutionMode::Async)]
    mode: ExecutionMode,

    /// Console log encoding.
    #[arg(long, env = "DEPLOYHOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// OTLP gRPC endpoint to export spans to.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format, args.otlp_endpoint.as_deref())?;

    let result = run(args).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Deployhook stopped with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let registry = config::load_registry(&args.config)
        .with_context(|| format!("failed to load repositories from {}", args.config.display()))?;
    if registry.is_empty() {
        warn!(config = %args.config.display(), "No repositories registered; every webhook will be rejected");
    }

    let store = Arc::new(JsonFileStatusStore::new(args.state));
    let state_path = store.path().display().to_string();
    let deployer = Deployer::restore(
        Arc::new(registry),
        store,
        Arc::new(ShellCommandRunner::new()),
        args.mode,
    )
    .await;

    let socket = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(
        address = %socket.local_addr().unwrap_or(args.listen),
        state = %state_path,
        "Listening for webhooks"
    );

    listener::serve(socket, deployer.clone(), shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Waiting for in-flight deployments");
    deployer.drain().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!(signal = "SIGINT", "Shutting down"),
        _ = terminate => info!(signal = "SIGTERM", "Shutting down"),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
