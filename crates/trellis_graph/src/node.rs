//! Graph node types and the namespaced node-id scheme.
//!
//! Node ids are namespaced strings: `file:<relative-path>` for source
//! files, `token:$<dotted.path>` for design tokens, and
//! `component:<name>` for UI components. The same strings double as
//! cache keys by caller convention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use trellis_common::Signature;

/// Opaque, copyable index of a node within one
/// [`DependencyGraph`](crate::DependencyGraph) instance.
///
/// Indices are dense and stable for the lifetime of the graph; edges are
/// stored as index pairs so traversal never re-hashes node-id strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeIdx(u32);

impl NodeIdx {
    /// Creates an index from a raw `u32`.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// The kind of entity a graph node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A source file (component definition, token sheet).
    File,
    /// A single design token, e.g. `$colors.primary`.
    Token,
    /// A UI component definition.
    Component,
}

impl NodeKind {
    /// Returns the namespace prefix used in node ids of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Token => "token",
            Self::Component => "component",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the dependency graph.
///
/// Carries the namespaced id, its kind, the signature captured at last
/// observation, and free-form string metadata (source path, token value)
/// that the compile function receives alongside the node id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepNode {
    /// Namespaced node id, unique within one graph instance.
    pub id: String,

    /// What kind of entity this node represents.
    pub kind: NodeKind,

    /// Signature at last observation (content hash or mtime).
    pub signature: Signature,

    /// Free-form metadata handed to the compile function.
    pub metadata: BTreeMap<String, String>,
}

/// Builds the node id for a source file path.
pub fn file_id(path: &str) -> String {
    format!("file:{path}")
}

/// Builds the node id for a design token reference (including the `$`).
pub fn token_id(name: &str) -> String {
    format!("token:{name}")
}

/// Builds the node id for a component name.
pub fn component_id(name: &str) -> String {
    format!("component:{name}")
}
