//! Metrics registry adapter and HTTP exporter.
//!
//! The polling core only needs three gauge operations (set, remove, reset)
//! on labelled gauge families. [`GaugeRegistry`] and [`GaugeFamily`] capture
//! that surface; [`MetricsRegistry`] implements it on top of a Prometheus
//! registry, and [`MetricsServer`] serves the registry on `/metrics`.
//!
//! Typical usage in the binary:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rippled_monitor::metrics::{MetricsRegistry, MetricsServer};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let server = MetricsServer::bind("localhost:8000").await?;
//! tokio::spawn(server.serve(registry.clone(), std::future::pending()));
//! ```

pub mod registry;
pub mod server;

pub use registry::{GaugeFamily, GaugeRegistry, MetricsRegistry};
pub use server::MetricsServer;
