//! Command-line flags and their merge with the optional config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use rippled_monitor::config::DEFAULT_NODE_URL;
use rippled_monitor::{ConfigError, ExporterConfig, FileConfig};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "rippled-exporter")]
#[command(about = "Prometheus exporter for rippled nodes", version)]
pub struct Cli {
    /// Metrics fetch interval in milliseconds [default: 100]
    #[arg(long, env = "RIPPLED_EXPORTER_INTERVAL")]
    pub interval: Option<u64>,

    /// Provide metrics on host:port/metrics [default: localhost:8000]
    #[arg(long, env = "RIPPLED_EXPORTER_LISTEN")]
    pub listen: Option<String>,

    /// Fetch info from this node (single-node mode) [default: http://localhost:5005/]
    #[arg(long, env = "RIPPLED_EXPORTER_NODE", conflicts_with = "config")]
    pub node: Option<String>,

    /// TOML file listing named nodes; switches to multi-node labels
    #[arg(long, short = 'c', env = "RIPPLED_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also expose process metrics of the exporter itself
    #[arg(long, env = "RIPPLED_EXPORTER_PROCESS_METRICS")]
    pub process_metrics: bool,

    /// Per-request RPC timeout in milliseconds (none by default)
    #[arg(long, env = "RIPPLED_EXPORTER_RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "RIPPLED_EXPORTER_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Resolves flags over the config file over built-in defaults.
    pub fn to_config(&self) -> Result<ExporterConfig, ConfigError> {
        let file = self
            .config
            .as_ref()
            .map(|path| FileConfig::load(path))
            .transpose()?;

        let mut cfg = match &file {
            Some(file) => ExporterConfig::multi(file.nodes.clone()),
            None => ExporterConfig::single(
                self.node
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NODE_URL.to_string()),
            ),
        };
        let file = file.unwrap_or_default();

        if let Some(ms) = self.interval.or(file.interval) {
            cfg.interval = Duration::from_millis(ms);
        }
        if let Some(listen) = self.listen.clone().or(file.listen) {
            cfg.listen = listen;
        }
        cfg.process_metrics = self.process_metrics || file.process_metrics.unwrap_or(false);
        cfg.rpc_timeout = self
            .rpc_timeout_ms
            .or(file.rpc_timeout_ms)
            .map(Duration::from_millis);

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Whether a parse error is a startup failure (exit status 1) rather than a
/// help or version request that clap prints and exits on by itself.
pub fn is_startup_failure(err: &clap::Error) -> bool {
    !matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
