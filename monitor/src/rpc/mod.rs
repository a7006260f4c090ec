//! JSON-RPC access to rippled nodes.
//!
//! [`NodeRpc`] abstracts over the transport so the reconciler can be driven
//! by a live [`HttpRpcClient`] in production and by in-memory fakes in
//! tests. [`types`] turns raw `result` objects into the few fields the
//! exporter publishes.

pub mod client;
pub mod types;

pub use client::{HttpRpcClient, NodeRpc, RpcError};
pub use types::{PeerRecord, PeerSummary, ServerInfo};
