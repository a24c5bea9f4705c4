//! Shared foundational types for the Trellis incremental build cache.
//!
//! Provides content hashing and change-detection signatures used by the
//! dependency graph, the artifact cache, and the build planner.

#![warn(missing_docs)]

pub mod hash;
pub mod signature;

pub use hash::{ContentHash, ParseHashError};
pub use signature::{ParseStrategyError, Signature, SignatureError, SignatureStrategy};
