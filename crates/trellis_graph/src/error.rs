//! Error types for dependency graph operations.

use std::path::PathBuf;

use trellis_common::SignatureError;

/// Errors that can occur when mutating or querying the dependency graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An edge or query referenced a node id that is not in the graph.
    ///
    /// Edges are strict: both endpoints must exist before `add_edge`.
    #[error("unknown node '{id}'")]
    UnknownNode {
        /// The id that was not found.
        id: String,
    },

    /// The requested node subset contains a dependency cycle.
    ///
    /// Topological ordering is impossible; the listed nodes are the ones
    /// still carrying unresolved in-subset edges.
    #[error("dependency cycle among: {}", nodes.join(", "))]
    CycleDetected {
        /// Node ids participating in the cycle, sorted.
        nodes: Vec<String>,
    },

    /// Computing a file signature failed.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// An I/O error occurred while persisting or loading the graph manifest.
    #[error("graph manifest I/O error at {path}: {source}")]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The graph manifest could not be serialized.
    #[error("graph manifest serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_display() {
        let err = GraphError::UnknownNode {
            id: "component:button".to_string(),
        };
        assert_eq!(err.to_string(), "unknown node 'component:button'");
    }

    #[test]
    fn cycle_display_lists_nodes() {
        let err = GraphError::CycleDetected {
            nodes: vec!["component:a".to_string(), "component:b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("component:a"));
        assert!(msg.contains("component:b"));
        assert!(msg.contains("cycle"));
    }

    #[test]
    fn io_display_includes_path() {
        let err = GraphError::Io {
            path: PathBuf::from(".trellis-cache/graph.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("graph.json"));
    }
}
