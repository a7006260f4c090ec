//! Change-detecting reconciliation of node status into gauges.
//!
//! One [`Reconciler`] exists per monitored node. Each round it:
//!
//! - fetches `server_info` and `peers` concurrently,
//! - derives version, ledger range/progress, fee and peer counts,
//! - compares them with the node's [`NodeObservationState`], and
//! - writes through [`NodeGauges`] only what changed.
//!
//! An RPC failure aborts the node's round before any write, so the tracked
//! state always matches what is published.

pub mod derive;
pub mod gauges;
pub mod reconciler;
pub mod state;

pub use derive::{LedgerRange, ProgressScale, fee_drops};
pub use gauges::NodeGauges;
pub use reconciler::{PEERS, PollError, Reconciler, SERVER_INFO};
pub use state::NodeObservationState;
