//! Content hashing for cache addressing and change detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A 128-bit XXH3 content hash.
///
/// Two inputs with the same `ContentHash` are assumed identical. Used to
/// address cache entries on disk and to detect when tracked sources have
/// changed since the last build.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Reads a file and computes the content hash of its bytes.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::from_bytes(&content))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Error returned when parsing a [`ContentHash`] from a hex string fails.
#[derive(Debug, thiserror::Error)]
#[error("invalid content hash '{input}': {reason}")]
pub struct ParseHashError {
    /// The rejected input string.
    pub input: String,
    /// Description of what was wrong with it.
    pub reason: String,
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    /// Parses the 32-hex-char form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseHashError {
                input: s.to_string(),
                reason: format!("expected 32 hex chars, got {}", s.len()),
            });
        }
        let mut bytes = [0u8; 16];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| ParseHashError {
                input: s.to_string(),
                reason: "not valid UTF-8".to_string(),
            })?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| ParseHashError {
                input: s.to_string(),
                reason: format!("'{pair}' is not a hex byte"),
            })?;
        }
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"button definition");
        let b = ContentHash::from_bytes(b"button definition");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"button");
        let b = ContentHash::from_bytes(b"card");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_32_hex_chars() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with(')'));
    }

    #[test]
    fn display_parse_roundtrip() {
        let h = ContentHash::from_bytes(b"roundtrip");
        let parsed: ContentHash = h.to_string().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "abcd".parse::<ContentHash>().unwrap_err();
        assert!(err.to_string().contains("expected 32 hex chars"));
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad = "zz".repeat(16);
        assert!(bad.parse::<ContentHash>().is_err());
    }

    #[test]
    fn from_file_hashes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("button.edn");
        std::fs::write(&path, "{:component :button}").unwrap();

        let from_file = ContentHash::from_file(&path).unwrap();
        let from_bytes = ContentHash::from_bytes(b"{:component :button}");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn from_file_missing_errors() {
        assert!(ContentHash::from_file(Path::new("/nonexistent/x.edn")).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
