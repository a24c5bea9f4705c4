//! Policy-driven invalidation scans.
//!
//! A policy names the directories to watch, the filename patterns that
//! select candidates, and the signature strategy used to decide whether
//! a candidate changed. Applying the policy walks the directories,
//! re-observes matching tracked files, and (when auto-invalidation is
//! on) invalidates the changed ones plus their dependent closures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trellis_cache::LayeredCache;
use trellis_common::SignatureStrategy;
use trellis_graph::{file_id, DependencyGraph};

use crate::engine::Invalidator;
use crate::error::InvalidateError;
use crate::pattern::wildcard_match;
use crate::strategy::InvalidationStrategy;

/// Configuration for a policy scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationPolicy {
    /// How file signatures are recomputed during the scan.
    pub strategy: SignatureStrategy,

    /// When `false`, the scan only reports changes without invalidating.
    pub auto_invalidate: bool,

    /// Directories to walk recursively.
    pub watch_dirs: Vec<PathBuf>,

    /// Filename patterns selecting candidate files, e.g. `*.edn`.
    pub patterns: Vec<String>,
}

/// What happened to one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyAction {
    /// The file changed and its closure was invalidated.
    Invalidated {
        /// Cache keys that were removed.
        keys: Vec<String>,
    },
    /// The file changed but auto-invalidation is off.
    Changed,
    /// The file's signature matches the stored one.
    Unchanged,
    /// The file matches a pattern but is not tracked in the graph.
    Untracked,
}

/// One scanned file and the action taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// The scanned file path.
    pub path: String,

    /// What the scan decided.
    pub action: PolicyAction,
}

/// Outcome of one policy application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyReport {
    /// Number of files that matched the patterns.
    pub scanned: usize,

    /// Per-file outcomes, in path order.
    pub entries: Vec<PolicyEntry>,

    /// Directories that could not be read.
    pub warnings: Vec<String>,
}

impl PolicyReport {
    /// All cache keys invalidated by this scan, sorted.
    pub fn invalidated_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| match &entry.action {
                PolicyAction::Invalidated { keys } => Some(keys.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Walks the policy's watch directories and invalidates changed files.
pub fn apply_policy(
    cache: &LayeredCache,
    graph: &mut DependencyGraph,
    policy: &InvalidationPolicy,
) -> Result<PolicyReport, InvalidateError> {
    let mut report = PolicyReport::default();

    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in &policy.watch_dirs {
        collect_files(dir, &mut candidates, &mut report.warnings);
    }
    candidates.sort();
    candidates.dedup();

    for path in candidates {
        if !matches_any(&path, &policy.patterns) {
            continue;
        }
        report.scanned += 1;
        let path_str = path.to_string_lossy().into_owned();

        if !graph.contains(&file_id(&path_str)) {
            report.entries.push(PolicyEntry {
                path: path_str,
                action: PolicyAction::Untracked,
            });
            continue;
        }

        let changed = match graph.file_changed(&path, policy.strategy) {
            Ok(changed) => changed,
            Err(e) => {
                report.warnings.push(format!("cannot observe '{path_str}': {e}"));
                continue;
            }
        };

        let action = if !changed {
            PolicyAction::Unchanged
        } else if !policy.auto_invalidate {
            PolicyAction::Changed
        } else {
            let strategy = match policy.strategy {
                SignatureStrategy::ContentHash => InvalidationStrategy::ContentHash,
                SignatureStrategy::Mtime => InvalidationStrategy::Timestamp,
            };
            let inner = Invalidator::new(cache, graph).apply(strategy, &path_str)?;
            report.warnings.extend(inner.warnings);
            PolicyAction::Invalidated {
                keys: inner.invalidated,
            }
        };

        report.entries.push(PolicyEntry {
            path: path_str,
            action,
        });
    }

    Ok(report)
}

/// Recursively collects regular files under `dir`.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>, warnings: &mut Vec<String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warnings.push(format!("cannot read directory '{}': {e}", dir.display()));
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out, warnings);
        } else {
            out.push(path);
        }
    }
}

/// A path matches when any pattern matches its filename or full path.
fn matches_any(path: &Path, patterns: &[String]) -> bool {
    let full = path.to_string_lossy();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    patterns
        .iter()
        .any(|p| wildcard_match(p, &name) || wildcard_match(p, &full))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_common::SignatureStrategy;

    fn make_policy(dir: &Path, auto: bool) -> InvalidationPolicy {
        InvalidationPolicy {
            strategy: SignatureStrategy::ContentHash,
            auto_invalidate: auto,
            watch_dirs: vec![dir.to_path_buf()],
            patterns: vec!["*.edn".to_string()],
        }
    }

    /// One tracked token file feeding a component, plus a stray readme.
    fn make_world(dir: &Path) -> (LayeredCache, DependencyGraph, PathBuf) {
        let tokens = dir.join("tokens.edn");
        std::fs::write(&tokens, "v1").unwrap();
        std::fs::write(dir.join("readme.md"), "docs").unwrap();

        let cache = LayeredCache::memory_only();
        let mut graph = DependencyGraph::new();
        graph
            .track_file(&tokens, SignatureStrategy::ContentHash)
            .unwrap();
        graph.track_component("button", "x", Some(&tokens)).unwrap();

        let fid = file_id(&tokens.to_string_lossy());
        cache.put(&fid, b"artifact".to_vec()).unwrap();
        cache.put("component:button", b"artifact".to_vec()).unwrap();

        (cache, graph, tokens)
    }

    #[test]
    fn unchanged_files_reported_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, mut graph, _tokens) = make_world(dir.path());
        let policy = make_policy(dir.path(), true);

        let report = apply_policy(&cache, &mut graph, &policy).unwrap();

        assert_eq!(report.scanned, 1, "readme.md does not match *.edn");
        assert_eq!(report.entries[0].action, PolicyAction::Unchanged);
        assert!(cache.get("component:button").is_some());
    }

    #[test]
    fn changed_file_invalidates_closure() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, mut graph, tokens) = make_world(dir.path());
        std::fs::write(&tokens, "v2").unwrap();

        let policy = make_policy(dir.path(), true);
        let report = apply_policy(&cache, &mut graph, &policy).unwrap();

        let keys = report.invalidated_keys();
        assert!(keys.contains(&"component:button".to_string()));
        assert_eq!(cache.get("component:button"), None);
    }

    #[test]
    fn dry_run_reports_without_invalidating() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, mut graph, tokens) = make_world(dir.path());
        std::fs::write(&tokens, "v2").unwrap();

        let policy = make_policy(dir.path(), false);
        let report = apply_policy(&cache, &mut graph, &policy).unwrap();

        assert_eq!(report.entries[0].action, PolicyAction::Changed);
        assert!(cache.get("component:button").is_some(), "nothing invalidated");
        assert!(report.invalidated_keys().is_empty());
    }

    #[test]
    fn untracked_matching_files_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, mut graph, _tokens) = make_world(dir.path());
        std::fs::write(dir.path().join("new.edn"), "fresh").unwrap();

        let policy = make_policy(dir.path(), true);
        let report = apply_policy(&cache, &mut graph, &policy).unwrap();

        assert_eq!(report.scanned, 2);
        assert!(report
            .entries
            .iter()
            .any(|e| e.action == PolicyAction::Untracked));
    }

    #[test]
    fn walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("components").join("forms");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("input.edn");
        std::fs::write(&file, "v1").unwrap();

        let cache = LayeredCache::memory_only();
        let mut graph = DependencyGraph::new();
        graph
            .track_file(&file, SignatureStrategy::ContentHash)
            .unwrap();

        let policy = make_policy(dir.path(), true);
        let report = apply_policy(&cache, &mut graph, &policy).unwrap();
        assert_eq!(report.scanned, 1);
    }

    #[test]
    fn missing_watch_dir_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LayeredCache::memory_only();
        let mut graph = DependencyGraph::new();
        let policy = make_policy(&dir.path().join("missing"), true);

        let report = apply_policy(&cache, &mut graph, &policy).unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.warnings.len(), 1);
    }
}
