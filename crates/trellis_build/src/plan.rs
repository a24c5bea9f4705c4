//! Build plan data model: change sets, affected closures, and the
//! ordered plan handed to the executor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trellis_common::Signature;

/// Result of comparing current path signatures against the graph.
///
/// The four sets are disjoint and sorted for deterministic output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Tracked nodes whose signature differs from the stored one.
    pub changed: Vec<String>,

    /// Tracked nodes whose signature matches the stored one.
    pub unchanged: Vec<String>,

    /// Paths not present in the graph at all.
    pub new: Vec<String>,

    /// Tracked nodes whose backing path no longer exists.
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// `true` when nothing is new, changed, or deleted.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.new.is_empty() && self.deleted.is_empty()
    }

    /// Number of nodes needing recompilation (changed + new).
    pub fn dirty_count(&self) -> usize {
        self.changed.len() + self.new.len()
    }
}

/// Nodes whose cached artifacts are no longer trustworthy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectedSet {
    /// Direct dependents of the changed nodes.
    pub direct: Vec<String>,

    /// Full transitive dependent closure of the changed nodes.
    pub transitive: Vec<String>,

    /// Changed nodes plus their closures, sorted and deduplicated.
    pub all: Vec<String>,
}

/// A deterministic incremental build plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildPlan {
    /// What changed since the last observation.
    pub changes: ChangeSet,

    /// The dependent closure derived from the change set.
    pub affected: AffectedSet,

    /// Total order to process: every dependency precedes its dependents.
    ///
    /// Covers the affected closure plus the requested-but-unchanged
    /// nodes; the executor skips members whose cached artifact is still
    /// valid.
    pub build_order: Vec<String>,

    /// Expected number of actual compilations (the affected count).
    pub estimated_work: usize,

    /// Freshly observed signatures for changed and new nodes, keyed by
    /// node id. Nodes absent here build against their stored signature.
    pub signatures: BTreeMap<String, Signature>,
}
