//! Views over rippled `server_info` and `peers` results.
//!
//! Results are not validated against a schema. Each field is extracted on
//! its own, so a missing or mistyped field only disables the metric that
//! depends on it instead of failing the whole response.

use std::collections::BTreeMap;

use serde_json::Value;

/// Key under which the total peer count is published.
pub const ALL_PEERS: &str = "all";
/// Key for peers that did not report a version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// The parts of `server_info.info` the exporter publishes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerInfo {
    /// `info.build_version`, e.g. `"1.12.0"`.
    pub build_version: Option<String>,
    /// `info.complete_ledgers`, e.g. `"32570-84211234"`.
    pub complete_ledgers: Option<String>,
    /// Whether `info.validated_ledger` is present at all.
    pub has_validated_ledger: bool,
    /// `info.validated_ledger.base_fee_xrp`, in XRP.
    pub base_fee_xrp: Option<f64>,
}

impl ServerInfo {
    /// Extracts the published fields from a `server_info` result object.
    pub fn from_result(result: &Value) -> Self {
        let info = result.get("info").unwrap_or(&Value::Null);
        let validated = info.get("validated_ledger").filter(|v| v.is_object());

        Self {
            build_version: info
                .get("build_version")
                .and_then(Value::as_str)
                .map(str::to_string),
            complete_ledgers: info
                .get("complete_ledgers")
                .and_then(Value::as_str)
                .map(str::to_string),
            has_validated_ledger: validated.is_some(),
            base_fee_xrp: validated
                .and_then(|v| v.get("base_fee_xrp"))
                .and_then(Value::as_f64),
        }
    }
}

/// A single entry of the `peers` result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerRecord {
    /// Version string the peer announced, e.g. `"rippled-1.12.0"`.
    pub version: Option<String>,
}

/// The `peers` result reduced to what the exporter needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerSummary {
    pub peers: Vec<PeerRecord>,
}

impl PeerSummary {
    /// Extracts peer records; an absent or non-array `peers` yields none.
    pub fn from_result(result: &Value) -> Self {
        let peers = result
            .get("peers")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| PeerRecord {
                        version: item
                            .get("version")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { peers }
    }

    /// Peer counts keyed by version, plus the total under [`ALL_PEERS`].
    ///
    /// Versions are chosen by remote peers, so a peer announcing the
    /// reserved [`ALL_PEERS`] key is counted under [`UNKNOWN_VERSION`].
    pub fn version_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for peer in &self.peers {
            let version = match peer.version.as_deref() {
                Some(ALL_PEERS) | None => UNKNOWN_VERSION,
                Some(version) => version,
            };
            *counts.entry(version.to_string()).or_insert(0) += 1;
        }
        counts.insert(ALL_PEERS.to_string(), self.peers.len() as u64);
        counts
    }
}
