//! Pure report data with a thin text adapter.
//!
//! [`system_report`] computes a structured snapshot of the cache tiers
//! and the graph; [`render_text`] is the only place that formats it for
//! humans. Anything machine-facing serializes the report directly.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use trellis_cache::{CacheStats, LayeredCache};
use trellis_graph::DependencyGraph;

/// Shape of the dependency graph at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Total tracked nodes.
    pub node_count: usize,

    /// Total distinct edges.
    pub edge_count: usize,

    /// Node counts per kind (`file`, `token`, `component`).
    pub nodes_by_kind: BTreeMap<String, usize>,
}

/// Snapshot of the whole cache subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    /// Memory (L1) tier counters.
    pub memory: CacheStats,

    /// Disk (L2) tier counters, when the tier is enabled.
    pub disk: Option<CacheStats>,

    /// Graph shape.
    pub graph: GraphSummary,
}

/// Computes the current system snapshot. Pure: no output, no mutation.
pub fn system_report(cache: &LayeredCache, graph: &DependencyGraph) -> SystemReport {
    let stats = cache.stats();
    SystemReport {
        memory: stats.memory,
        disk: stats.disk,
        graph: GraphSummary {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            nodes_by_kind: graph.nodes_by_kind(),
        },
    }
}

/// Renders a report as human-readable text.
pub fn render_text(report: &SystemReport) -> String {
    let mut out = String::new();

    render_tier(&mut out, "memory", &report.memory);
    match &report.disk {
        Some(disk) => render_tier(&mut out, "disk", disk),
        None => {
            let _ = writeln!(out, "cache (disk):   disabled");
        }
    }

    let kinds: Vec<String> = report
        .graph
        .nodes_by_kind
        .iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect();
    let kinds = if kinds.is_empty() {
        "empty".to_string()
    } else {
        kinds.join(", ")
    };
    let _ = writeln!(
        out,
        "graph: {} nodes ({kinds}), {} edges",
        report.graph.node_count, report.graph.edge_count
    );

    out
}

fn render_tier(out: &mut String, name: &str, stats: &CacheStats) {
    let _ = writeln!(
        out,
        "cache ({name}): {} entries, {} hits, {} misses, {} evictions ({:.1}% hit rate)",
        stats.size,
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate() * 100.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_world() -> (LayeredCache, DependencyGraph) {
        let cache = LayeredCache::memory_only();
        let mut graph = DependencyGraph::new();
        graph.track_token("$colors.primary", "#335577");
        graph
            .track_component("button", "{:bg $colors.primary}", None)
            .unwrap();
        cache.put("component:button", b"artifact".to_vec()).unwrap();
        cache.get("component:button");
        cache.get("component:missing");
        (cache, graph)
    }

    #[test]
    fn report_counts_graph_shape() {
        let (cache, graph) = make_world();
        let report = system_report(&cache, &graph);

        assert_eq!(report.graph.node_count, 2);
        assert_eq!(report.graph.edge_count, 1);
        assert_eq!(report.graph.nodes_by_kind["token"], 1);
        assert_eq!(report.graph.nodes_by_kind["component"], 1);
    }

    #[test]
    fn report_carries_tier_stats() {
        let (cache, graph) = make_world();
        let report = system_report(&cache, &graph);

        assert_eq!(report.memory.hits, 1);
        assert_eq!(report.memory.misses, 1);
        assert!(report.disk.is_none());
    }

    #[test]
    fn render_mentions_tiers_and_graph() {
        let (cache, graph) = make_world();
        let text = render_text(&system_report(&cache, &graph));

        assert!(text.contains("cache (memory):"));
        assert!(text.contains("disabled"));
        assert!(text.contains("2 nodes"));
        assert!(text.contains("1 edges"));
        assert!(text.contains("1 component"));
    }

    #[test]
    fn report_serializes_to_json() {
        let (cache, graph) = make_world();
        let report = system_report(&cache, &graph);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("node_count"));
        let back: SystemReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.graph.node_count, 2);
    }
}
