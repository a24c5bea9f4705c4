//! The closed set of invalidation strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidateError;

/// How a cache invalidation request is interpreted.
///
/// A closed enum: every consumer matches exhaustively, so a new strategy
/// (or a typo in a config file) is a compile-time or parse-time error,
/// never a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationStrategy {
    /// Recompute the target file's content hash; invalidate on change.
    ContentHash,
    /// Recompute the target file's mtime; invalidate on change.
    Timestamp,
    /// Target is already known changed; invalidate it and its closure.
    Dependency,
    /// Wildcard match over node ids; invalidate the matches.
    Pattern,
    /// Pick between content-hash, dependency, and direct per target.
    Selective,
    /// Clear the entire cache. Graph signatures are left untouched.
    Global,
}

impl fmt::Display for InvalidationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ContentHash => "content-hash",
            Self::Timestamp => "timestamp",
            Self::Dependency => "dependency",
            Self::Pattern => "pattern",
            Self::Selective => "selective",
            Self::Global => "global",
        };
        f.write_str(name)
    }
}

impl FromStr for InvalidationStrategy {
    type Err = InvalidateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content-hash" => Ok(Self::ContentHash),
            "timestamp" => Ok(Self::Timestamp),
            "dependency" => Ok(Self::Dependency),
            "pattern" => Ok(Self::Pattern),
            "selective" => Ok(Self::Selective),
            "global" => Ok(Self::Global),
            other => Err(InvalidateError::UnknownStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_names() {
        let names = [
            ("content-hash", InvalidationStrategy::ContentHash),
            ("timestamp", InvalidationStrategy::Timestamp),
            ("dependency", InvalidationStrategy::Dependency),
            ("pattern", InvalidationStrategy::Pattern),
            ("selective", InvalidationStrategy::Selective),
            ("global", InvalidationStrategy::Global),
        ];
        for (name, expected) in names {
            assert_eq!(name.parse::<InvalidationStrategy>().unwrap(), expected);
        }
    }

    #[test]
    fn parse_unknown_errors() {
        let err = "everything".parse::<InvalidationStrategy>().unwrap_err();
        assert!(err.to_string().contains("everything"));
    }

    #[test]
    fn display_roundtrip() {
        for s in [
            InvalidationStrategy::ContentHash,
            InvalidationStrategy::Timestamp,
            InvalidationStrategy::Dependency,
            InvalidationStrategy::Pattern,
            InvalidationStrategy::Selective,
            InvalidationStrategy::Global,
        ] {
            let back: InvalidationStrategy = s.to_string().parse().unwrap();
            assert_eq!(s, back);
        }
    }
}
