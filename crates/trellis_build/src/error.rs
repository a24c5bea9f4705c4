//! Error types for build planning and execution.

use trellis_cache::CacheError;
use trellis_graph::GraphError;

/// Errors that abort a build before or during execution.
///
/// Per-node compile failures are not here: they are captured in
/// [`BuildState::failed`](crate::BuildState) and isolated via blocked
/// bookkeeping. These errors are structural: a cycle in the requested
/// subset aborts planning before any compile call.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The affected node set contains a dependency cycle; no build order
    /// exists. Planning aborts before execution starts.
    #[error("cannot order build: dependency cycle among {}", nodes.join(", "))]
    Cycle {
        /// The node ids participating in the cycle, sorted.
        nodes: Vec<String>,
    },

    /// The dependency graph rejected an operation.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A cache tier failed during a maintenance operation.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display_names_nodes() {
        let err = BuildError::Cycle {
            nodes: vec!["component:a".to_string(), "component:b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("component:a"));
        assert!(msg.contains("component:b"));
    }

    #[test]
    fn graph_error_converts() {
        let err: BuildError = GraphError::UnknownNode {
            id: "x".to_string(),
        }
        .into();
        assert!(err.to_string().contains("unknown node"));
    }
}
