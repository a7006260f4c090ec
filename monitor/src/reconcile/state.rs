use std::collections::BTreeMap;

use super::derive::LedgerRange;

/// Last values published for one node.
///
/// Every field starts unset so the first successful round publishes
/// everything, including zero values. A field is only updated right after
/// the matching gauge write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeObservationState {
    pub version: Option<String>,
    pub ledgers: Option<LedgerRange>,
    /// Base fee in drops.
    pub fee: Option<u64>,
    /// Peer counts keyed by version, including `all`.
    pub peers: Option<BTreeMap<String, u64>>,
}
