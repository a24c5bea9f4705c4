//! Error types for invalidation operations.

use trellis_cache::CacheError;
use trellis_graph::GraphError;

/// Errors that can occur while applying an invalidation strategy.
///
/// A target that matches nothing is not an error: it yields an empty
/// report with a warning, per the no-op contract for unknown targets.
#[derive(Debug, thiserror::Error)]
pub enum InvalidateError {
    /// The strategy name is not one of the recognized set.
    #[error("unknown invalidation strategy '{0}'")]
    UnknownStrategy(String),

    /// A pattern was empty or otherwise unusable.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// A cache tier failed while removing entries.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The dependency graph rejected an operation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strategy_display() {
        let err = InvalidateError::UnknownStrategy("md5".to_string());
        assert_eq!(err.to_string(), "unknown invalidation strategy 'md5'");
    }

    #[test]
    fn invalid_pattern_display() {
        let err = InvalidateError::InvalidPattern("empty pattern".to_string());
        assert!(err.to_string().contains("empty pattern"));
    }
}
