//! Invalidation strategies for the incremental build cache.
//!
//! Turns "something changed" into "these cache entries are no longer
//! valid": signature recomputation, dependency-closure propagation,
//! wildcard pattern matching, selective auto-detection, and global
//! clearing, plus batch grouping and policy-driven directory scans.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod pattern;
pub mod policy;
pub mod strategy;

pub use engine::{ChangedGroups, InvalidationReport, Invalidator};
pub use error::InvalidateError;
pub use pattern::wildcard_match;
pub use policy::{apply_policy, InvalidationPolicy, PolicyAction, PolicyEntry, PolicyReport};
pub use strategy::InvalidationStrategy;
