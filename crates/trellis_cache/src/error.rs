//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Reads are fail-safe and never produce these: a missing, truncated, or
/// corrupt entry is a cache miss. Errors surface only from writes and
/// maintenance operations, where the caller decides whether a degraded
/// (uncached) result is acceptable.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while writing or deleting cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An entry header could not be serialized.
    #[error("cache serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
