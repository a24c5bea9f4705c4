//! The invalidator: applies a strategy against a cache + graph pair.
//!
//! Every application produces an [`InvalidationReport`] naming what was
//! invalidated and why. Targets that match nothing are warnings, not
//! errors; a typo'd token name must not abort a build session.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_cache::LayeredCache;
use trellis_common::{Signature, SignatureStrategy};
use trellis_graph::{component_id, file_id, token_id, DependencyGraph};

use crate::error::InvalidateError;
use crate::pattern::wildcard_match;
use crate::strategy::InvalidationStrategy;

/// What one invalidation request did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationReport {
    /// The strategy label that was applied.
    pub strategy: String,

    /// The request's target (path, node id, pattern, or `:all`).
    pub target: String,

    /// Cache keys that were invalidated, sorted.
    pub invalidated: Vec<String>,

    /// `true` when the whole cache was cleared (global strategy).
    pub cleared_all: bool,

    /// Human-readable notes: unknown targets, unreadable files.
    pub warnings: Vec<String>,
}

impl InvalidationReport {
    fn new(strategy: &str, target: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            target: target.to_string(),
            invalidated: Vec::new(),
            cleared_all: false,
            warnings: Vec::new(),
        }
    }

    /// `true` when nothing was invalidated and the cache was not cleared.
    pub fn is_noop(&self) -> bool {
        self.invalidated.is_empty() && !self.cleared_all
    }
}

/// Grouped changed inputs for batch invalidation.
///
/// Entries are plain names: file paths, token names (with `$`), and
/// component names. The batch maps them to node ids itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangedGroups {
    /// Changed source file paths.
    pub files: Vec<String>,

    /// Changed token names, e.g. `$colors.primary`.
    pub tokens: Vec<String>,

    /// Changed component names.
    pub components: Vec<String>,
}

impl ChangedGroups {
    fn node_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.files
            .iter()
            .map(|f| file_id(f))
            .chain(self.tokens.iter().map(|t| token_id(t)))
            .chain(self.components.iter().map(|c| component_id(c)))
    }
}

/// Applies invalidation strategies against a cache and graph.
///
/// Borrows the graph mutably because signature-comparing strategies
/// update stored signatures when they observe a change.
pub struct Invalidator<'a> {
    cache: &'a LayeredCache,
    graph: &'a mut DependencyGraph,
}

impl<'a> Invalidator<'a> {
    /// Creates an invalidator over the given cache and graph.
    pub fn new(cache: &'a LayeredCache, graph: &'a mut DependencyGraph) -> Self {
        Self { cache, graph }
    }

    /// Applies a strategy to a target and reports the outcome.
    pub fn apply(
        &mut self,
        strategy: InvalidationStrategy,
        target: &str,
    ) -> Result<InvalidationReport, InvalidateError> {
        match strategy {
            InvalidationStrategy::ContentHash => {
                self.by_signature(target, SignatureStrategy::ContentHash, "content-hash")
            }
            InvalidationStrategy::Timestamp => {
                self.by_signature(target, SignatureStrategy::Mtime, "timestamp")
            }
            InvalidationStrategy::Dependency => self.by_dependency(target),
            InvalidationStrategy::Pattern => self.by_pattern(target),
            InvalidationStrategy::Selective => self.selective(target),
            InvalidationStrategy::Global => self.global(),
        }
    }

    /// Invalidates a batch of grouped changes in one pass.
    ///
    /// Each node's transitive closure is computed at most once, however
    /// many groups name it or its ancestors.
    pub fn invalidate_batch(
        &mut self,
        groups: &ChangedGroups,
    ) -> Result<InvalidationReport, InvalidateError> {
        let mut report = InvalidationReport::new("dependency (batch)", "batch");
        let mut keys: BTreeSet<String> = BTreeSet::new();

        for id in groups.node_ids() {
            if !self.graph.contains(&id) {
                report
                    .warnings
                    .push(format!("'{id}' is not tracked; skipped"));
                continue;
            }
            // Already covered by an earlier member's closure.
            if keys.contains(&id) {
                continue;
            }
            keys.insert(id.clone());
            keys.extend(self.graph.transitive_dependents(&id));
        }

        for key in &keys {
            self.cache.invalidate(key)?;
        }
        report.invalidated = keys.into_iter().collect();
        Ok(report)
    }

    fn by_signature(
        &mut self,
        path_str: &str,
        strategy: SignatureStrategy,
        label: &str,
    ) -> Result<InvalidationReport, InvalidateError> {
        let mut report = InvalidationReport::new(label, path_str);
        let id = file_id(path_str);

        let Some(node) = self.graph.node(&id) else {
            report
                .warnings
                .push(format!("'{path_str}' is not tracked; nothing invalidated"));
            return Ok(report);
        };
        let stored = node.signature;

        let current = match Signature::of_file(Path::new(path_str), strategy) {
            Ok(sig) => sig,
            Err(e) => {
                report.warnings.push(format!("cannot observe '{path_str}': {e}"));
                return Ok(report);
            }
        };

        if current == stored {
            return Ok(report);
        }

        self.graph.set_signature(&id, current)?;
        report.invalidated = self.invalidate_closure(&id)?;
        Ok(report)
    }

    fn by_dependency(&mut self, target: &str) -> Result<InvalidationReport, InvalidateError> {
        let mut report = InvalidationReport::new("dependency", target);
        if !self.graph.contains(target) {
            report
                .warnings
                .push(format!("'{target}' is not tracked; nothing invalidated"));
            return Ok(report);
        }
        report.invalidated = self.invalidate_closure(target)?;
        Ok(report)
    }

    fn by_pattern(&mut self, pattern: &str) -> Result<InvalidationReport, InvalidateError> {
        if pattern.is_empty() {
            return Err(InvalidateError::InvalidPattern(
                "pattern must not be empty".to_string(),
            ));
        }

        let mut report = InvalidationReport::new("pattern", pattern);
        let matches: Vec<String> = self
            .graph
            .iter()
            .filter(|node| wildcard_match(pattern, &node.id))
            .map(|node| node.id.clone())
            .collect();

        if matches.is_empty() {
            report
                .warnings
                .push(format!("pattern '{pattern}' matched no nodes"));
            return Ok(report);
        }

        let mut invalidated: Vec<String> = matches;
        invalidated.sort_unstable();
        for key in &invalidated {
            self.cache.invalidate(key)?;
        }
        report.invalidated = invalidated;
        Ok(report)
    }

    fn selective(&mut self, target: &str) -> Result<InvalidationReport, InvalidateError> {
        // A tracked file path gets signature comparison; a tracked node
        // id gets dependency propagation; anything else is treated as a
        // raw cache key and invalidated directly.
        let mut report = if self.graph.contains(&file_id(target)) {
            self.by_signature(target, SignatureStrategy::ContentHash, "selective")?
        } else if self.graph.contains(target) {
            let mut r = self.by_dependency(target)?;
            r.strategy = "selective".to_string();
            r
        } else {
            self.cache.invalidate(target)?;
            let mut r = InvalidationReport::new("selective", target);
            r.invalidated = vec![target.to_string()];
            r
        };
        report.target = target.to_string();
        Ok(report)
    }

    fn global(&mut self) -> Result<InvalidationReport, InvalidateError> {
        self.cache.clear()?;
        let mut report = InvalidationReport::new("global", ":all");
        report.cleared_all = true;
        Ok(report)
    }

    fn invalidate_closure(&mut self, id: &str) -> Result<Vec<String>, InvalidateError> {
        let mut keys = vec![id.to_string()];
        keys.extend(self.graph.transitive_dependents(id));
        keys.sort_unstable();
        for key in &keys {
            self.cache.invalidate(key)?;
        }
        Ok(keys)
    }
}
