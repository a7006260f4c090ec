//! Exporter configuration.
//!
//! This module aggregates everything the polling core needs at startup:
//!
//! - the set of monitored nodes (`MonitoredNode`),
//! - the metric layout (single node vs. named multi-node labels),
//! - poll interval, listen address and RPC timeout.
//!
//! `ExporterConfig` is built once by the binary (from CLI flags, env vars
//! and an optional TOML file) and is immutable afterwards.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default delay between the start of two polling rounds, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 100;
/// Default `host:port` for the `/metrics` listener.
pub const DEFAULT_LISTEN: &str = "localhost:8000";
/// Default JSON-RPC endpoint of a locally running rippled.
pub const DEFAULT_NODE_URL: &str = "http://localhost:5005/";
/// Implicit node name used in single-node mode.
pub const DEFAULT_NODE_NAME: &str = "default";

/// A single rippled endpoint to poll.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoredNode {
    /// Label value identifying the node in multi-node mode.
    pub name: String,
    /// JSON-RPC URL, e.g. `"http://10.0.0.5:5005/"`.
    pub url: String,
}

impl MonitoredNode {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// How metric families are labelled and how peers are republished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricLayout {
    /// One node, no `name` label, progress as a fraction, peers family
    /// reset and fully republished every round.
    Single,
    /// Many nodes sharing families keyed by a `name` label, progress as a
    /// percentage, peers diffed against the last published map.
    Multi,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("no nodes configured")]
    NoNodes,
    #[error("duplicate node name `{0}`")]
    DuplicateNode(String),
    #[error("node `{0}` has an empty url")]
    EmptyUrl(String),
    #[error("interval must be greater than zero")]
    ZeroInterval,
    #[error("invalid listen address `{0}`, expected host:port")]
    InvalidListen(String),
}

/// On-disk configuration file (TOML).
///
/// ```toml
/// interval = 1000
/// listen = "0.0.0.0:8000"
///
/// [[nodes]]
/// name = "hub-1"
/// url = "http://10.0.0.5:5005/"
/// ```
///
/// Every scalar is optional so CLI flags and defaults can fill the gaps.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub interval: Option<u64>,
    pub listen: Option<String>,
    pub process_metrics: Option<bool>,
    pub rpc_timeout_ms: Option<u64>,
    #[serde(default)]
    pub nodes: Vec<MonitoredNode>,
}

impl FileConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: label.clone(),
            source,
        })?;
        Self::parse(&raw, &label)
    }

    /// Parses TOML text; `origin` is only used in error messages.
    pub fn parse(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }
}

/// Fully resolved configuration consumed by the polling core.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    /// Target delay between the starts of two polling rounds.
    pub interval: Duration,
    /// `host:port` the `/metrics` endpoint binds to.
    pub listen: String,
    /// Nodes polled every round. Fixed for the process lifetime.
    pub nodes: Vec<MonitoredNode>,
    pub layout: MetricLayout,
    /// Also expose process-level metrics (CPU, memory, fds).
    pub process_metrics: bool,
    /// Optional per-request timeout; `None` leaves the transport defaults.
    pub rpc_timeout: Option<Duration>,
}

impl ExporterConfig {
    /// Single-node configuration with the implicit node name.
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            listen: DEFAULT_LISTEN.to_string(),
            nodes: vec![MonitoredNode::new(DEFAULT_NODE_NAME, url)],
            layout: MetricLayout::Single,
            process_metrics: false,
            rpc_timeout: None,
        }
    }

    /// Multi-node configuration over the given named nodes.
    pub fn multi(nodes: Vec<MonitoredNode>) -> Self {
        Self {
            nodes,
            layout: MetricLayout::Multi,
            ..Self::single(DEFAULT_NODE_URL)
        }
    }

    /// Checks invariants that would otherwise surface as confusing runtime
    /// behaviour (clashing label sets, a zero-length interval, ...).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        validate_listen(&self.listen)?;

        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.url.trim().is_empty() {
                return Err(ConfigError::EmptyUrl(node.name.clone()));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(ConfigError::DuplicateNode(node.name.clone()));
            }
        }

        Ok(())
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::single(DEFAULT_NODE_URL)
    }
}

fn validate_listen(listen: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidListen(listen.to_string());
    let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}
