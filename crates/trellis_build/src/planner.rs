//! Change detection, affected-node computation, and plan assembly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use trellis_common::{Signature, SignatureStrategy};
use trellis_graph::{file_id, DependencyGraph, GraphError, NodeKind};

use crate::error::BuildError;
use crate::plan::{AffectedSet, BuildPlan, ChangeSet};

/// Options controlling plan construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    /// How path signatures are recomputed during change detection.
    pub strategy: SignatureStrategy,
}

/// Compares each path's current signature to the graph's stored one.
///
/// A path absent from the graph is `new`; a tracked path that can no
/// longer be observed is `deleted`; a differing signature is `changed`;
/// anything else is `unchanged`. Does not mutate the graph.
pub fn detect_changes(
    graph: &DependencyGraph,
    paths: &[PathBuf],
    strategy: SignatureStrategy,
) -> ChangeSet {
    observe(graph, paths, strategy).0
}

/// Derives the untrustworthy node set from already-known changed ids.
///
/// `direct` is the union of direct dependents, `transitive` the union of
/// full dependent closures, and `all` adds the changed ids themselves.
pub fn compute_affected(graph: &DependencyGraph, changed_ids: &[String]) -> AffectedSet {
    let mut direct: BTreeSet<String> = BTreeSet::new();
    let mut transitive: BTreeSet<String> = BTreeSet::new();

    for id in changed_ids {
        direct.extend(graph.dependents(id).into_iter().map(String::from));
        transitive.extend(graph.transitive_dependents(id));
    }

    let mut all: BTreeSet<String> = changed_ids.iter().cloned().collect();
    all.extend(direct.iter().cloned());
    all.extend(transitive.iter().cloned());

    AffectedSet {
        direct: direct.into_iter().collect(),
        transitive: transitive.into_iter().collect(),
        all: all.into_iter().collect(),
    }
}

/// Builds a complete incremental plan for the given paths.
///
/// Detects changes, registers new files in the graph, computes the
/// affected closure, and orders it topologically. The build order also
/// carries the requested-but-unchanged file nodes so the executor can
/// verify their cached artifacts; they contribute nothing to
/// `estimated_work`. A cycle in the affected set aborts planning with
/// [`BuildError::Cycle`] before any compilation happens.
pub fn plan_incremental_build(
    graph: &mut DependencyGraph,
    paths: &[PathBuf],
    opts: &PlanOptions,
) -> Result<BuildPlan, BuildError> {
    let (changes, signatures) = observe(graph, paths, opts.strategy);

    // New files enter the graph now so ordering and execution see them.
    for path in paths {
        let path_str = path.to_string_lossy().into_owned();
        let id = file_id(&path_str);
        if changes.new.binary_search(&id).is_ok() {
            if let Some(&signature) = signatures.get(&id) {
                let mut metadata = BTreeMap::new();
                metadata.insert("path".to_string(), path_str);
                graph.add_node(&id, NodeKind::File, signature, metadata);
            }
        }
    }

    let mut dirty: Vec<String> = changes.changed.clone();
    dirty.extend(changes.new.iter().cloned());
    let affected = compute_affected(graph, &dirty);

    let mut members: BTreeSet<String> = affected.all.iter().cloned().collect();
    members.extend(changes.unchanged.iter().cloned());
    let member_list: Vec<String> = members.into_iter().collect();

    let build_order = graph.topo_sort(&member_list).map_err(|e| match e {
        GraphError::CycleDetected { nodes } => BuildError::Cycle { nodes },
        other => BuildError::Graph(other),
    })?;

    Ok(BuildPlan {
        estimated_work: affected.all.len(),
        changes,
        affected,
        build_order,
        signatures,
    })
}

fn observe(
    graph: &DependencyGraph,
    paths: &[PathBuf],
    strategy: SignatureStrategy,
) -> (ChangeSet, BTreeMap<String, Signature>) {
    let mut changes = ChangeSet::default();
    let mut signatures = BTreeMap::new();

    for path in paths {
        let id = file_id(&path.to_string_lossy());
        let stored = graph.node(&id).map(|node| node.signature);
        let current = Signature::of_file(path, strategy);

        match (stored, current) {
            (None, Ok(signature)) => {
                signatures.insert(id.clone(), signature);
                changes.new.push(id);
            }
            // Unreadable and untracked: nothing to plan for.
            (None, Err(_)) => {}
            (Some(_), Err(_)) => changes.deleted.push(id),
            (Some(stored), Ok(current)) if stored == current => changes.unchanged.push(id),
            (Some(_), Ok(current)) => {
                signatures.insert(id.clone(), current);
                changes.changed.push(id);
            }
        }
    }

    changes.changed.sort_unstable();
    changes.unchanged.sort_unstable();
    changes.new.sort_unstable();
    changes.deleted.sort_unstable();
    (changes, signatures)
}
