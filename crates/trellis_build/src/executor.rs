//! Plan execution: cache consultation, compilation, failure isolation.
//!
//! The executor walks the build order sequentially. A node with a valid
//! cached artifact for its current signature is skipped; anything else
//! is handed to the caller's compile function. A failing node blocks its
//! not-yet-visited descendants instead of letting them compile against
//! stale or invalid input.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use trellis_cache::LayeredCache;
use trellis_common::Signature;
use trellis_graph::{DependencyGraph, GraphError};

use crate::error::BuildError;
use crate::plan::BuildPlan;
use crate::planner::{plan_incremental_build, PlanOptions};

/// One per-node compile failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFailure {
    /// The node that failed to compile.
    pub node_id: String,

    /// The compile function's error message.
    pub error: String,
}

/// Outcome bookkeeping for one build execution.
///
/// The four outcome lists are disjoint; together with the warnings they
/// let a caller distinguish "nothing to do" from "something broke".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildState {
    /// Nodes whose compile function ran and succeeded.
    pub compiled: Vec<String>,

    /// Nodes whose cached artifact was still valid.
    pub skipped: Vec<String>,

    /// Nodes not attempted because an ancestor failed.
    pub blocked: Vec<String>,

    /// Nodes whose compile function failed, with the error.
    pub failed: Vec<NodeFailure>,

    /// Non-fatal degradations, e.g. artifacts that could not be persisted.
    pub warnings: Vec<String>,

    /// When execution started.
    pub started_at: SystemTime,

    /// When execution finished; `None` while in progress.
    pub finished_at: Option<SystemTime>,
}

impl BuildState {
    fn begin() -> Self {
        Self {
            compiled: Vec::new(),
            skipped: Vec::new(),
            blocked: Vec::new(),
            failed: Vec::new(),
            warnings: Vec::new(),
            started_at: SystemTime::now(),
            finished_at: None,
        }
    }

    /// `true` when no node failed or was blocked.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }
}

/// Caller-tunable execution hooks.
#[derive(Default)]
pub struct ExecuteOptions<'a> {
    /// Invoked after every processed node with the state so far.
    pub on_progress: Option<&'a mut dyn FnMut(&BuildState)>,
}

/// Builds the cache key for a node at a given signature.
///
/// Keying on both means a stale artifact from an older signature can
/// never satisfy a lookup for the current one.
pub fn cache_key(node_id: &str, signature: &Signature) -> String {
    format!("{node_id}@{signature}")
}

/// Executes a build plan against the cache and graph.
///
/// Per-node compile failures are captured in the returned state, not
/// propagated; only structural problems (a plan referencing unknown
/// nodes) abort execution.
pub fn execute_incremental_build<F>(
    cache: &LayeredCache,
    graph: &mut DependencyGraph,
    plan: &BuildPlan,
    compile_fn: &mut F,
    opts: &mut ExecuteOptions<'_>,
) -> Result<BuildState, BuildError>
where
    F: FnMut(&str, &BTreeMap<String, String>) -> Result<Vec<u8>, String>,
{
    let mut state = BuildState::begin();
    let mut blocked_pending: HashSet<String> = HashSet::new();

    for node_id in &plan.build_order {
        if blocked_pending.contains(node_id) {
            state.blocked.push(node_id.clone());
            notify(opts, &state);
            continue;
        }

        let Some(node) = graph.node(node_id) else {
            return Err(BuildError::Graph(GraphError::UnknownNode {
                id: node_id.clone(),
            }));
        };
        let signature = plan
            .signatures
            .get(node_id)
            .copied()
            .unwrap_or(node.signature);
        let metadata = node.metadata.clone();

        let key = cache_key(node_id, &signature);
        if cache.get(&key).is_some() {
            state.skipped.push(node_id.clone());
            notify(opts, &state);
            continue;
        }

        match compile_fn(node_id, &metadata) {
            Ok(artifact) => {
                if let Err(e) = cache.put(&key, artifact) {
                    state
                        .warnings
                        .push(format!("artifact for '{node_id}' not persisted: {e}"));
                }
                graph.set_signature(node_id, signature)?;
                state.compiled.push(node_id.clone());
            }
            Err(error) => {
                for descendant in graph.transitive_dependents(node_id) {
                    blocked_pending.insert(descendant);
                }
                state.failed.push(NodeFailure {
                    node_id: node_id.clone(),
                    error,
                });
            }
        }
        notify(opts, &state);
    }

    state.finished_at = Some(SystemTime::now());
    Ok(state)
}

/// Plans and executes in one call.
///
/// Between the two phases, every node in the affected closure has its
/// cache entry under the *stored* signature invalidated. A dependent
/// whose own bytes did not change keeps its signature, so without this
/// step its stale artifact would still satisfy the executor's lookup.
pub fn incremental_compile<F>(
    cache: &LayeredCache,
    graph: &mut DependencyGraph,
    paths: &[PathBuf],
    compile_fn: &mut F,
    plan_opts: &PlanOptions,
    exec_opts: &mut ExecuteOptions<'_>,
) -> Result<BuildState, BuildError>
where
    F: FnMut(&str, &BTreeMap<String, String>) -> Result<Vec<u8>, String>,
{
    let plan = plan_incremental_build(graph, paths, plan_opts)?;
    for id in &plan.affected.all {
        if let Some(node) = graph.node(id) {
            cache.invalidate(&cache_key(id, &node.signature))?;
        }
    }
    execute_incremental_build(cache, graph, &plan, compile_fn, exec_opts)
}

fn notify(opts: &mut ExecuteOptions<'_>, state: &BuildState) {
    if let Some(on_progress) = opts.on_progress.as_mut() {
        on_progress(state);
    }
}
