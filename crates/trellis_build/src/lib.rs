//! Incremental build planning and execution.
//!
//! The planner turns "these paths might have changed" into a
//! deterministic [`BuildPlan`]: a change set, the affected dependent
//! closure, and a topological build order. The executor walks the plan,
//! consults the artifact cache, invokes the external compile function
//! only for nodes whose artifacts are stale, and isolates per-node
//! failures so one broken input cannot poison the rest of the build.

#![warn(missing_docs)]

pub mod error;
pub mod executor;
pub mod plan;
pub mod planner;
pub mod report;

pub use error::BuildError;
pub use executor::{
    cache_key, execute_incremental_build, incremental_compile, BuildState, ExecuteOptions,
    NodeFailure,
};
pub use plan::{AffectedSet, BuildPlan, ChangeSet};
pub use planner::{compute_affected, detect_changes, plan_incremental_build, PlanOptions};
pub use report::{render_text, system_report, GraphSummary, SystemReport};
