//! Per-node reconciliation of RPC status into gauges.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use crate::config::{MetricLayout, MonitoredNode};
use crate::metrics::GaugeFamily;
use crate::rpc::{NodeRpc, PeerSummary, RpcError, ServerInfo};

use super::derive::{LedgerRange, ProgressScale, fee_drops};
use super::gauges::NodeGauges;
use super::state::NodeObservationState;

/// RPC method returning build version, ledger range and base fee.
pub const SERVER_INFO: &str = "server_info";
/// RPC method listing connected peers.
pub const PEERS: &str = "peers";

/// A failed RPC call that aborted one node's round.
#[derive(Debug, thiserror::Error)]
#[error("{method} on node {node} failed: {source}")]
pub struct PollError {
    pub node: String,
    pub method: &'static str,
    #[source]
    pub source: RpcError,
}

/// Publishes one node's status, writing only values that changed.
pub struct Reconciler<C, G> {
    node: MonitoredNode,
    rpc: Arc<C>,
    gauges: NodeGauges<G>,
    state: NodeObservationState,
}

impl<C, G> Reconciler<C, G>
where
    C: NodeRpc,
    G: GaugeFamily,
{
    pub fn new(node: MonitoredNode, rpc: Arc<C>, gauges: NodeGauges<G>) -> Self {
        Self {
            node,
            rpc,
            gauges,
            state: NodeObservationState::default(),
        }
    }

    pub fn node(&self) -> &MonitoredNode {
        &self.node
    }

    /// Last published values.
    pub fn state(&self) -> &NodeObservationState {
        &self.state
    }

    /// Runs one round for this node.
    ///
    /// Both RPC calls must succeed before anything is written; otherwise
    /// the error is returned and gauges and state are left untouched.
    /// Unparsable fields only skip their own metric.
    pub async fn reconcile(&mut self) -> Result<(), PollError> {
        let url = self.node.url.as_str();
        let (info, peers) = tokio::join!(
            self.rpc.call(url, SERVER_INFO, json!({})),
            self.rpc.call(url, PEERS, json!({})),
        );

        let info = info.map_err(|source| self.poll_error(SERVER_INFO, source))?;
        let peers = peers.map_err(|source| self.poll_error(PEERS, source))?;

        let info = ServerInfo::from_result(&info);
        let peers = PeerSummary::from_result(&peers);

        self.apply_version(&info);
        self.apply_ledgers(&info);
        self.apply_fee(&info);
        self.apply_peers(&peers);
        Ok(())
    }

    fn poll_error(&self, method: &'static str, source: RpcError) -> PollError {
        PollError {
            node: self.node.name.clone(),
            method,
            source,
        }
    }

    fn apply_version(&mut self, info: &ServerInfo) {
        let Some(version) = info.build_version.as_deref() else {
            return;
        };
        if self.state.version.as_deref() == Some(version) {
            return;
        }

        self.gauges.set_version(&self.node.name, version);
        self.state.version = Some(version.to_string());
        tracing::info!(node = %self.node.name, version, "update version");
    }

    fn apply_ledgers(&mut self, info: &ServerInfo) {
        let Some(range) = info.complete_ledgers.as_deref().and_then(LedgerRange::parse) else {
            return;
        };
        let scale = ProgressScale::for_layout(self.gauges.layout());
        let Some(progress) = range.progress(scale) else {
            return;
        };
        if self.state.ledgers == Some(range) {
            return;
        }

        let node = self.node.name.as_str();
        self.gauges.set_ledgers(node, "from", range.from as f64);
        self.gauges.set_ledgers(node, "to", range.to as f64);
        self.gauges.set_ledgers(node, "total", range.total());
        self.gauges.set_ledgers(node, "progress", progress);
        self.state.ledgers = Some(range);
        tracing::info!(node, ledgers = %range, progress, "update ledgers");
    }

    fn apply_fee(&mut self, info: &ServerInfo) {
        if !info.has_validated_ledger {
            return;
        }
        let Some(fee) = info.base_fee_xrp.and_then(fee_drops) else {
            return;
        };
        if self.state.fee == Some(fee) {
            return;
        }

        self.gauges.set_fee(&self.node.name, fee);
        self.state.fee = Some(fee);
        tracing::info!(node = %self.node.name, fee, "update fee");
    }

    fn apply_peers(&mut self, peers: &PeerSummary) {
        let fresh = peers.version_counts();
        let node = self.node.name.as_str();

        match self.gauges.layout() {
            MetricLayout::Single => {
                // Full republish so versions that vanished leave no series.
                self.gauges.reset_peers();
                for (version, count) in &fresh {
                    self.gauges.set_peers(node, version, *count);
                }
            }
            MetricLayout::Multi => {
                // The family is shared with other nodes, so diff instead of
                // resetting, and drop series of versions that vanished.
                let empty = BTreeMap::new();
                let previous = self.state.peers.as_ref().unwrap_or(&empty);
                let mut changed = false;

                for (version, count) in &fresh {
                    if previous.get(version) != Some(count) {
                        self.gauges.set_peers(node, version, *count);
                        changed = true;
                    }
                }
                for version in previous.keys().filter(|v| !fresh.contains_key(*v)) {
                    self.gauges.remove_peers(node, version);
                    changed = true;
                }

                if changed {
                    tracing::debug!(node, peers = ?fresh, "update peers");
                }
            }
        }

        self.state.peers = Some(fresh);
    }
}
