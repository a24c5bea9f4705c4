//! The dependency graph: arena-backed nodes, index-pair edges, closures,
//! and topological ordering.
//!
//! Nodes live in a dense `Vec` with a name-to-index map; forward and
//! reverse adjacency lists are kept per node so dependent and dependency
//! queries are both O(degree) without re-hashing id strings during
//! traversal.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};
use std::path::Path;

use trellis_common::{Signature, SignatureStrategy};

use crate::error::GraphError;
use crate::node::{component_id, file_id, token_id, DepNode, NodeIdx, NodeKind};

/// A directed graph of files, tokens, and components.
///
/// An edge `(from, to)` means "`from` depends on `to`": `to` must be
/// built (or known valid) before `from`. Edges are strict: both
/// endpoints must already exist. Duplicate edges are a no-op.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Dense node storage; `NodeIdx` values index into this.
    nodes: Vec<DepNode>,

    /// Node-id string to arena index.
    index: HashMap<String, NodeIdx>,

    /// Forward adjacency: `deps[i]` are the nodes `i` depends on.
    deps: Vec<Vec<NodeIdx>>,

    /// Reverse adjacency: `rdeps[i]` are the nodes depending on `i`.
    rdeps: Vec<Vec<NodeIdx>>,

    /// Total number of distinct edges.
    edge_count: usize,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node, or updates an existing one in place.
    ///
    /// Updating replaces the signature and metadata but preserves the
    /// node's edges. Returns the node's index either way.
    pub fn add_node(
        &mut self,
        id: &str,
        kind: NodeKind,
        signature: Signature,
        metadata: BTreeMap<String, String>,
    ) -> NodeIdx {
        if let Some(&idx) = self.index.get(id) {
            let node = &mut self.nodes[idx.as_raw() as usize];
            node.kind = kind;
            node.signature = signature;
            node.metadata = metadata;
            return idx;
        }

        let idx = NodeIdx::from_raw(self.nodes.len() as u32);
        self.nodes.push(DepNode {
            id: id.to_string(),
            kind,
            signature,
            metadata,
        });
        self.index.insert(id.to_string(), idx);
        self.deps.push(Vec::new());
        self.rdeps.push(Vec::new());
        idx
    }

    /// Adds a directed dependency edge: `from` depends on `to`.
    ///
    /// Idempotent: adding the same edge twice is a no-op. Unknown
    /// endpoints are rejected with [`GraphError::UnknownNode`].
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_idx = self.require(from)?;
        let to_idx = self.require(to)?;

        let fwd = &mut self.deps[from_idx.as_raw() as usize];
        if fwd.contains(&to_idx) {
            return Ok(());
        }
        fwd.push(to_idx);
        self.rdeps[to_idx.as_raw() as usize].push(from_idx);
        self.edge_count += 1;
        Ok(())
    }

    /// Returns `true` if the graph contains a node with the given id.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the node with the given id, if tracked.
    pub fn node(&self, id: &str) -> Option<&DepNode> {
        self.index
            .get(id)
            .map(|idx| &self.nodes[idx.as_raw() as usize])
    }

    /// Replaces the stored signature of an existing node.
    ///
    /// Called by the build executor after a successful compile so the
    /// next change detection sees the node as up to date.
    pub fn set_signature(&mut self, id: &str, signature: Signature) -> Result<(), GraphError> {
        let idx = self.require(id)?;
        self.nodes[idx.as_raw() as usize].signature = signature;
        Ok(())
    }

    /// Direct dependencies of a node: what `id` needs.
    ///
    /// Unknown ids yield an empty list. Results are sorted by node id.
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, &self.deps)
    }

    /// Direct dependents of a node: what needs `id`.
    ///
    /// Unknown ids yield an empty list. Results are sorted by node id.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, &self.rdeps)
    }

    /// The full downstream closure of a node, excluding the node itself.
    ///
    /// BFS over reverse edges with a visited set, so cycles cannot cause
    /// non-termination. Returns sorted node ids.
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        self.closure(id, &self.rdeps)
    }

    /// The full upstream closure of a node, excluding the node itself.
    ///
    /// Everything `id` depends on, directly or transitively. Sorted.
    pub fn transitive_dependencies(&self, id: &str) -> Vec<String> {
        self.closure(id, &self.deps)
    }

    /// Recomputes a tracked file's signature and compares it to the
    /// stored one. Does not mutate the graph.
    pub fn file_changed(
        &self,
        path: &Path,
        strategy: SignatureStrategy,
    ) -> Result<bool, GraphError> {
        let id = file_id(&path.to_string_lossy());
        let idx = self.require(&id)?;
        let current = Signature::of_file(path, strategy)?;
        Ok(current != self.nodes[idx.as_raw() as usize].signature)
    }

    /// Tracks a source file: observes its signature and creates or
    /// updates its `file:` node.
    pub fn track_file(
        &mut self,
        path: &Path,
        strategy: SignatureStrategy,
    ) -> Result<NodeIdx, GraphError> {
        let signature = Signature::of_file(path, strategy)?;
        let path_str = path.to_string_lossy().into_owned();
        let mut metadata = BTreeMap::new();
        metadata.insert("path".to_string(), path_str.clone());
        Ok(self.add_node(&file_id(&path_str), NodeKind::File, signature, metadata))
    }

    /// Tracks a design token: creates or updates its `token:` node with
    /// a signature of the token's value.
    pub fn track_token(&mut self, name: &str, value: &str) -> NodeIdx {
        let mut metadata = BTreeMap::new();
        metadata.insert("value".to_string(), value.to_string());
        self.add_node(
            &token_id(name),
            NodeKind::Token,
            Signature::of_bytes(value.as_bytes()),
            metadata,
        )
    }

    /// Tracks a component: creates or updates its `component:` node,
    /// scans the definition for `$dotted.path` token references, and
    /// records `component -> token` edges for each.
    ///
    /// Referenced tokens not yet tracked are created as placeholder
    /// nodes; a later [`track_token`](Self::track_token) call updates
    /// them in place without disturbing the edges. When a source file is
    /// given, a `component -> file` edge is recorded too (the file must
    /// already be tracked).
    pub fn track_component(
        &mut self,
        name: &str,
        definition: &str,
        source_file: Option<&Path>,
    ) -> Result<NodeIdx, GraphError> {
        let comp_id = component_id(name);
        let mut metadata = BTreeMap::new();
        if let Some(path) = source_file {
            metadata.insert("path".to_string(), path.to_string_lossy().into_owned());
        }
        let idx = self.add_node(
            &comp_id,
            NodeKind::Component,
            Signature::of_bytes(definition.as_bytes()),
            metadata,
        );

        for token in scan_token_refs(definition) {
            let tok_id = token_id(&token);
            if !self.contains(&tok_id) {
                // Placeholder until the token itself is tracked.
                self.add_node(
                    &tok_id,
                    NodeKind::Token,
                    Signature::of_bytes(token.as_bytes()),
                    BTreeMap::new(),
                );
            }
            self.add_edge(&comp_id, &tok_id)?;
        }

        if let Some(path) = source_file {
            self.add_edge(&comp_id, &file_id(&path.to_string_lossy()))?;
        }

        Ok(idx)
    }

    /// A total order over `subset` in which every dependency precedes
    /// its dependents.
    ///
    /// Kahn's algorithm restricted to the induced subgraph; ties are
    /// broken by node id, so the order is deterministic. If the subset
    /// contains a cycle the result is [`GraphError::CycleDetected`]
    /// listing the offending ids, never a silently partial order.
    pub fn topo_sort(&self, subset: &[String]) -> Result<Vec<String>, GraphError> {
        let mut members = HashSet::with_capacity(subset.len());
        for id in subset {
            members.insert(self.require(id)?);
        }

        let mut indegree: HashMap<NodeIdx, usize> = HashMap::with_capacity(members.len());
        for &idx in &members {
            let within = self.deps[idx.as_raw() as usize]
                .iter()
                .filter(|d| members.contains(d))
                .count();
            indegree.insert(idx, within);
        }

        // Min-heap on node id for deterministic tie-breaking.
        let mut ready: BinaryHeap<Reverse<(&str, NodeIdx)>> = BinaryHeap::new();
        for (&idx, &deg) in &indegree {
            if deg == 0 {
                ready.push(Reverse((self.id_of(idx), idx)));
            }
        }

        let mut order = Vec::with_capacity(members.len());
        while let Some(Reverse((id, idx))) = ready.pop() {
            order.push(id.to_string());
            for &dependent in &self.rdeps[idx.as_raw() as usize] {
                if let Some(deg) = indegree.get_mut(&dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((self.id_of(dependent), dependent)));
                    }
                }
            }
        }

        if order.len() < members.len() {
            let mut nodes = Vec::new();
            for (&idx, &deg) in &indegree {
                if deg > 0 {
                    nodes.push(self.id_of(idx).to_string());
                }
            }
            nodes.sort();
            return Err(GraphError::CycleDetected { nodes });
        }

        Ok(order)
    }

    /// Returns the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the total number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Node counts grouped by kind, keyed by the kind's namespace prefix.
    pub fn nodes_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Iterates over all nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DepNode> {
        self.nodes.iter()
    }

    /// All edges as `(from, to)` id pairs, in insertion order of `from`.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (i, targets) in self.deps.iter().enumerate() {
            let from = &self.nodes[i].id;
            for &to in targets {
                out.push((from.clone(), self.id_of(to).to_string()));
            }
        }
        out
    }

    fn require(&self, id: &str) -> Result<NodeIdx, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode { id: id.to_string() })
    }

    fn id_of(&self, idx: NodeIdx) -> &str {
        &self.nodes[idx.as_raw() as usize].id
    }

    fn neighbors(&self, id: &str, adjacency: &[Vec<NodeIdx>]) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = adjacency[idx.as_raw() as usize]
            .iter()
            .map(|&n| self.id_of(n))
            .collect();
        out.sort_unstable();
        out
    }

    fn closure(&self, id: &str, adjacency: &[Vec<NodeIdx>]) -> Vec<String> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut out = Vec::new();

        while let Some(idx) = queue.pop_front() {
            for &next in &adjacency[idx.as_raw() as usize] {
                if visited.insert(next) {
                    out.push(self.id_of(next).to_string());
                    queue.push_back(next);
                }
            }
        }

        out.sort_unstable();
        out
    }
}

/// Extracts `$dotted.path` token references from a component definition.
///
/// A reference starts at `$` and runs over alphanumerics, `_`, `-`, and
/// `.`; trailing dots are not part of the reference. Duplicates are
/// returned once, in order of first appearance.
fn scan_token_refs(definition: &str) -> Vec<String> {
    let bytes = definition.as_bytes();
    let mut refs = Vec::new();
    let mut seen = HashSet::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i;
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric()
                    || bytes[i] == b'_'
                    || bytes[i] == b'-'
                    || bytes[i] == b'.')
            {
                i += 1;
            }
            let mut token = &definition[start..i];
            token = token.trim_end_matches('.');
            if token.len() > 1 && seen.insert(token.to_string()) {
                refs.push(token.to_string());
            }
        } else {
            i += 1;
        }
    }

    refs
}
