//! Polling core of the rippled exporter.
//!
//! This crate provides the building blocks that turn a rippled node's
//! JSON-RPC status into Prometheus gauges:
//!
//! - a JSON-RPC client and response types (`rpc`),
//! - per-node change tracking and the gauge reconciler (`reconcile`),
//! - a self-pacing poll scheduler (`scheduler`),
//! - the Prometheus registry adapter and `/metrics` exporter (`metrics`),
//! - and the exporter configuration (`config`).
//!
//! The `rippled-exporter` binary composes these pieces; tests compose them
//! with fake RPC backends instead of live nodes.

pub mod config;
pub mod metrics;
pub mod reconcile;
pub mod rpc;
pub mod scheduler;

#[cfg(test)]
mod testing;

// Re-export top-level configuration types.
pub use config::{ConfigError, ExporterConfig, FileConfig, MetricLayout, MonitoredNode};

// Re-export the RPC client and its error type.
pub use rpc::{HttpRpcClient, NodeRpc, PeerSummary, RpcError, ServerInfo};

// Re-export the reconciliation core.
pub use reconcile::{NodeGauges, NodeObservationState, PollError, Reconciler};

// Re-export the registry adapter and exporter.
pub use metrics::{GaugeFamily, GaugeRegistry, MetricsRegistry, MetricsServer};

pub use scheduler::Poller;

/// Poller used by the binary: live HTTP client, prometheus gauges.
pub type DefaultPoller = Poller<HttpRpcClient, prometheus::GaugeVec>;
