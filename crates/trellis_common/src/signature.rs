//! Change-detection signatures captured when a source is observed.
//!
//! A [`Signature`] records what a tracked file, token, or component looked
//! like at last observation, either as a content hash or as a modification
//! time. Comparing a freshly computed signature against the stored one is
//! how the graph and the build planner decide whether a node changed.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;

/// How signatures are computed for files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureStrategy {
    /// Hash the file's bytes (default; robust against touch-without-edit).
    ContentHash,
    /// Use the file's modification time (cheaper, coarser).
    Mtime,
}

impl Default for SignatureStrategy {
    fn default() -> Self {
        Self::ContentHash
    }
}

impl fmt::Display for SignatureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentHash => write!(f, "content-hash"),
            Self::Mtime => write!(f, "timestamp"),
        }
    }
}

/// Error returned when a strategy name is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown signature strategy '{0}' (expected 'content-hash' or 'timestamp')")]
pub struct ParseStrategyError(pub String);

impl FromStr for SignatureStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content-hash" => Ok(Self::ContentHash),
            "timestamp" => Ok(Self::Mtime),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Error computing a signature for a path.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The file could not be read or stat'ed.
    #[error("cannot observe {path}: {source}")]
    Io {
        /// The path that failed.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A signature captured at last observation of a node.
///
/// Two signatures compare equal only when both the variant and the value
/// match. A stored `Content` compared against a freshly computed `Mtime`
/// (after a strategy switch) is unequal, so everything conservatively
/// re-detects as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    /// XXH3-128 hash of the source bytes.
    Content(ContentHash),
    /// Modification time in milliseconds since the Unix epoch.
    Mtime(u64),
}

impl Signature {
    /// Computes the signature of a file using the given strategy.
    pub fn of_file(path: &Path, strategy: SignatureStrategy) -> Result<Self, SignatureError> {
        match strategy {
            SignatureStrategy::ContentHash => {
                let hash = ContentHash::from_file(path).map_err(|e| SignatureError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                Ok(Self::Content(hash))
            }
            SignatureStrategy::Mtime => {
                let meta = std::fs::metadata(path).map_err(|e| SignatureError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                let mtime = meta.modified().map_err(|e| SignatureError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                let millis = mtime
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                Ok(Self::Mtime(millis))
            }
        }
    }

    /// Computes a content signature directly from in-memory bytes.
    ///
    /// Used for token values and component definitions that are not backed
    /// by their own file.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::Content(ContentHash::from_bytes(data))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(hash) => write!(f, "{hash}"),
            Self::Mtime(millis) => write!(f, "mtime:{millis}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parse_known_names() {
        assert_eq!(
            "content-hash".parse::<SignatureStrategy>().unwrap(),
            SignatureStrategy::ContentHash
        );
        assert_eq!(
            "timestamp".parse::<SignatureStrategy>().unwrap(),
            SignatureStrategy::Mtime
        );
    }

    #[test]
    fn strategy_parse_unknown_errors() {
        let err = "md5".parse::<SignatureStrategy>().unwrap_err();
        assert!(err.to_string().contains("md5"));
    }

    #[test]
    fn strategy_display_roundtrip() {
        for s in [SignatureStrategy::ContentHash, SignatureStrategy::Mtime] {
            let back: SignatureStrategy = s.to_string().parse().unwrap();
            assert_eq!(s, back);
        }
    }

    #[test]
    fn content_signature_stable_across_touch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.edn");
        std::fs::write(&path, "{:colors {:primary \"#335577\"}}").unwrap();

        let before = Signature::of_file(&path, SignatureStrategy::ContentHash).unwrap();
        // Rewrite identical content
        std::fs::write(&path, "{:colors {:primary \"#335577\"}}").unwrap();
        let after = Signature::of_file(&path, SignatureStrategy::ContentHash).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn content_signature_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.edn");
        std::fs::write(&path, "a").unwrap();
        let before = Signature::of_file(&path, SignatureStrategy::ContentHash).unwrap();
        std::fs::write(&path, "b").unwrap();
        let after = Signature::of_file(&path, SignatureStrategy::ContentHash).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn mtime_signature_computed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("button.edn");
        std::fs::write(&path, "x").unwrap();
        let sig = Signature::of_file(&path, SignatureStrategy::Mtime).unwrap();
        match sig {
            Signature::Mtime(ms) => assert!(ms > 0),
            other => panic!("expected mtime signature, got {other:?}"),
        }
    }

    #[test]
    fn cross_variant_compares_unequal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.edn");
        std::fs::write(&path, "x").unwrap();
        let content = Signature::of_file(&path, SignatureStrategy::ContentHash).unwrap();
        let mtime = Signature::of_file(&path, SignatureStrategy::Mtime).unwrap();
        assert_ne!(content, mtime);
    }

    #[test]
    fn of_file_missing_errors() {
        let err =
            Signature::of_file(Path::new("/nonexistent/f.edn"), SignatureStrategy::ContentHash)
                .unwrap_err();
        assert!(err.to_string().contains("cannot observe"));
    }

    #[test]
    fn of_bytes_matches_content_hash() {
        let sig = Signature::of_bytes(b"$colors.primary");
        assert_eq!(
            sig,
            Signature::Content(ContentHash::from_bytes(b"$colors.primary"))
        );
    }

    #[test]
    fn serde_roundtrip() {
        let sig = Signature::of_bytes(b"value");
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }
}
