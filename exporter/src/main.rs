// exporter/src/main.rs

//! rippled exporter binary.
//!
//! Polls one or more rippled nodes over JSON-RPC and serves their status on
//! `GET /metrics` for Prometheus:
//!
//! - a poll loop reconciling every node on a fixed interval,
//! - a `/metrics` exporter reading the shared registry,
//! - clean shutdown on SIGINT / SIGTERM.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use cli::{Cli, LogFormat};
use rippled_monitor::{DefaultPoller, HttpRpcClient, MetricsRegistry, MetricsServer};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !cli::is_startup_failure(&e) => e.exit(),
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!("invalid arguments: {}", e.to_string().trim_end());
            std::process::exit(1);
        }
    };
    init_tracing(cli.log_format);

    if let Err(e) = run(cli).await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rippled_exporter=info,rippled_monitor=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let cfg = cli
        .to_config()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    // ---------------------------
    // Metrics registry
    // ---------------------------

    let metrics = if cfg.process_metrics {
        MetricsRegistry::with_process_metrics()
    } else {
        MetricsRegistry::new()
    };
    let metrics =
        Arc::new(metrics.map_err(|e| format!("failed to initialise metrics registry: {e}"))?);

    // ---------------------------
    // RPC client + poller
    // ---------------------------

    let rpc = Arc::new(
        HttpRpcClient::new(cfg.rpc_timeout)
            .map_err(|e| format!("failed to create RPC client: {e}"))?,
    );
    let mut poller = DefaultPoller::from_config(&cfg, rpc, metrics.as_ref())
        .map_err(|e| format!("failed to register gauges: {e}"))?;

    // ---------------------------
    // Metrics exporter
    // ---------------------------

    let server = MetricsServer::bind(&cfg.listen)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", cfg.listen))?;
    tracing::info!("listen at http://{}/metrics", cfg.listen);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.serve(metrics.clone(), async move {
        let _ = stop_rx.await;
    }));

    // ---------------------------
    // Poll until signalled
    // ---------------------------

    let signal = tokio::select! {
        _ = poller.run() => Ok(()),
        res = shutdown_signal() => res,
    };

    let _ = stop_tx.send(());
    let _ = server_task.await;

    signal.map_err(|e| format!("failed to listen for shutdown signals: {e}"))
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutdown signal received");
    Ok(())
}
