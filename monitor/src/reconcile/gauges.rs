//! Gauge families published for rippled nodes and their label layout.
//!
//! | family                     | single-node labels | multi-node labels |
//! |----------------------------|--------------------|-------------------|
//! | `rippled_version`          | `value`            | `name`, `value`   |
//! | `rippled_complete_ledgers` | `type`             | `name`, `topic`   |
//! | `rippled_fee`              | `type` (= `base`)  | `name`            |
//! | `rippled_peers`            | `version`          | `name`, `topic`   |

use crate::config::MetricLayout;
use crate::metrics::{GaugeFamily, GaugeRegistry};

pub const VERSION_METRIC: &str = "rippled_version";
pub const LEDGERS_METRIC: &str = "rippled_complete_ledgers";
pub const FEE_METRIC: &str = "rippled_fee";
pub const PEERS_METRIC: &str = "rippled_peers";

/// Label value of the single-node fee series.
const BASE_FEE: &str = "base";

// Label names for version, ledgers, fee and peers, in that order.
const SINGLE_LABELS: [&[&str]; 4] = [&["value"], &["type"], &["type"], &["version"]];
const MULTI_LABELS: [&[&str]; 4] = [
    &["name", "value"],
    &["name", "topic"],
    &["name"],
    &["name", "topic"],
];

/// Handles to the four gauge families, shared by every node's reconciler.
#[derive(Clone)]
pub struct NodeGauges<G> {
    layout: MetricLayout,
    version: G,
    ledgers: G,
    fee: G,
    peers: G,
}

impl<G: GaugeFamily> NodeGauges<G> {
    /// Gets or creates the families in `registry` with `layout`'s labels.
    pub fn register<R>(registry: &R, layout: MetricLayout) -> Result<Self, prometheus::Error>
    where
        R: GaugeRegistry<Family = G>,
    {
        let [version, ledgers, fee, peers] = match layout {
            MetricLayout::Single => SINGLE_LABELS,
            MetricLayout::Multi => MULTI_LABELS,
        };

        Ok(Self {
            layout,
            version: registry.gauge(VERSION_METRIC, "Client version", version)?,
            ledgers: registry.gauge(LEDGERS_METRIC, "Info about complete ledgers", ledgers)?,
            fee: registry.gauge(FEE_METRIC, "Fee in drops (1e-6 XRP)", fee)?,
            peers: registry.gauge(PEERS_METRIC, "Peer count", peers)?,
        })
    }

    pub fn layout(&self) -> MetricLayout {
        self.layout
    }

    /// Marks `version` as present for `node`. Each version is its own series.
    pub fn set_version(&self, node: &str, version: &str) {
        self.version.set(&self.labels(node, version), 1.0);
    }

    /// Sets one of the `from`/`to`/`total`/`progress` ledger series.
    pub fn set_ledgers(&self, node: &str, topic: &str, value: f64) {
        self.ledgers.set(&self.labels(node, topic), value);
    }

    pub fn set_fee(&self, node: &str, drops: u64) {
        let labels = match self.layout {
            MetricLayout::Single => [BASE_FEE],
            MetricLayout::Multi => [node],
        };
        self.fee.set(&labels, drops as f64);
    }

    pub fn set_peers(&self, node: &str, version: &str, count: u64) {
        self.peers.set(&self.labels(node, version), count as f64);
    }

    pub fn remove_peers(&self, node: &str, version: &str) {
        self.peers.remove(&self.labels(node, version));
    }

    /// Drops every peer series, for all nodes.
    pub fn reset_peers(&self) {
        self.peers.reset();
    }

    fn labels<'a>(&self, node: &'a str, key: &'a str) -> Vec<&'a str> {
        match self.layout {
            MetricLayout::Single => vec![key],
            MetricLayout::Multi => vec![node, key],
        }
    }
}
