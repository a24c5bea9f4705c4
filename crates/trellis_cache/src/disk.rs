//! Content-addressed persistent cache tier.
//!
//! Each entry lives in its own file at `<cache_dir>/<xxh3(key)>.cache`.
//! The payload is prefixed with a bincode header carrying magic bytes, a
//! format version, and a checksum; any validation failure on read is a
//! cache miss. Writes go through a temp file and an atomic rename so a
//! concurrent reader never observes a partial entry.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use trellis_common::ContentHash;

use crate::error::CacheError;
use crate::stats::CacheStats;

/// Magic bytes identifying a Trellis cache entry file.
const ENTRY_MAGIC: [u8; 4] = *b"TRLS";

/// Current entry format version. Increment on breaking changes to the
/// header or payload layout.
const ENTRY_FORMAT_VERSION: u32 = 1;

/// File extension for cache entries.
const ENTRY_EXT: &str = "cache";

/// Header prepended to every entry for validation on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryHeader {
    /// Magic bytes: must be `b"TRLS"`.
    magic: [u8; 4],

    /// Entry format version.
    format_version: u32,

    /// Content hash of the payload, for corruption detection.
    checksum: ContentHash,
}

/// The persistent (L2) cache tier.
///
/// Methods take `&self`; the stats counters are behind a mutex so a
/// `DiskCache` can be shared across threads. Lookups that fail for any
/// reason (absent file, bad header, checksum mismatch, version drift)
/// are misses.
#[derive(Debug)]
pub struct DiskCache {
    /// Directory holding one `.cache` file per entry.
    cache_dir: PathBuf,

    /// Disk-tier counters; `size` is computed on demand.
    stats: Mutex<CacheStats>,
}

impl DiskCache {
    /// Creates a disk cache rooted at the given directory.
    ///
    /// The directory itself is created lazily on first write.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Returns the backing file path for a key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let hash = ContentHash::from_bytes(key.as_bytes());
        self.cache_dir.join(format!("{hash}.{ENTRY_EXT}"))
    }

    /// Reads a value, validating the entry header.
    ///
    /// Fail-safe: any problem reads as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let payload = self.read_validated(&self.entry_path(key));
        let mut stats = self.lock_stats();
        match payload {
            Some(_) => stats.hits += 1,
            None => stats.misses += 1,
        }
        payload
    }

    /// Writes a value atomically: temp file first, then rename into place.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })?;

        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(value),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // Layout: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + value.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(value);

        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &output).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })?;

        self.lock_stats().puts += 1;
        Ok(())
    }

    /// Deletes the entry's backing file. No-op if absent.
    pub fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Removes every `.cache` file in the directory. Returns how many
    /// were deleted. A missing directory counts as empty.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        let entries = std::fs::read_dir(&self.cache_dir).map_err(|e| CacheError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.cache_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Returns a snapshot of this tier's counters, with `size` set to the
    /// current number of entry files on disk.
    pub fn stats(&self) -> CacheStats {
        let mut stats = *self.lock_stats();
        stats.size = self.entry_count();
        stats
    }

    fn entry_count(&self) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(ENTRY_EXT))
            .count()
    }

    fn read_validated(&self, path: &Path) -> Option<Vec<u8>> {
        let raw = std::fs::read(path).ok()?;

        // Need at least the 4-byte header length
        if raw.len() < 4 {
            return None;
        }
        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: EntryHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;

        if header.magic != ENTRY_MAGIC {
            return None;
        }
        if header.format_version != ENTRY_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        Some(payload.to_vec())
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, CacheStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
