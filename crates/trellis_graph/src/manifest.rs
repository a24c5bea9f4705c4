//! Graph persistence across sessions.
//!
//! The graph is saved as pretty JSON with a format-version gate.
//! Loading is fail-safe: a missing, unparsable, or version-mismatched
//! manifest yields `None` and the caller starts with a fresh graph,
//! re-detecting everything as new on the next build.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::DependencyGraph;
use crate::node::DepNode;

/// Current manifest format version. Increment on breaking layout changes.
const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Serialized form of a [`DependencyGraph`].
#[derive(Debug, Serialize, Deserialize)]
struct GraphManifest {
    /// Format version; mismatches invalidate the whole manifest.
    format_version: u32,

    /// All nodes, in arena order.
    nodes: Vec<DepNode>,

    /// All edges as `(from, to)` id pairs.
    edges: Vec<(String, String)>,
}

impl DependencyGraph {
    /// Persists the graph as JSON at the given path.
    ///
    /// Parent directories are created as needed.
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let manifest = GraphManifest {
            format_version: MANIFEST_FORMAT_VERSION,
            nodes: self.iter().cloned().collect(),
            edges: self.edges(),
        };
        let json =
            serde_json::to_string_pretty(&manifest).map_err(|e| GraphError::Serialization {
                reason: e.to_string(),
            })?;
        std::fs::write(path, json).map_err(|e| GraphError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads a graph previously written by [`save`](Self::save).
    ///
    /// Fail-safe: any problem yields `None` rather than an error.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let manifest: GraphManifest = serde_json::from_str(&content).ok()?;
        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return None;
        }

        let mut graph = DependencyGraph::new();
        for node in manifest.nodes {
            graph.add_node(&node.id, node.kind, node.signature, node.metadata);
        }
        for (from, to) in manifest.edges {
            graph.add_edge(&from, &to).ok()?;
        }
        Some(graph)
    }
}
