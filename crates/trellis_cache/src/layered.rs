//! Two-tier cache composition with promotion.
//!
//! L1 is the in-memory LRU; L2 is the optional disk store. A read that
//! misses L1 but hits L2 promotes the value into L1 (a copy; L2 remains
//! authoritative for persistence). All methods take `&self` so a
//! `LayeredCache` behind an `Arc` can be shared between a build in
//! progress and other collaborators (file watchers, inspection tools).

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::disk::DiskCache;
use crate::error::CacheError;
use crate::memory::{MemoryCache, DEFAULT_MAX_SIZE};
use crate::stats::LayerStats;

/// Construction parameters for a [`LayeredCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// L1 capacity in entries.
    pub max_size: usize,

    /// Optional L1 entry lifetime.
    pub ttl: Option<Duration>,

    /// L2 directory; `None` disables the disk tier.
    pub disk_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
            disk_dir: None,
        }
    }
}

/// A memory-over-disk artifact cache.
///
/// Values are opaque byte payloads (serialized compile artifacts).
#[derive(Debug)]
pub struct LayeredCache {
    memory: Mutex<MemoryCache<Vec<u8>>>,
    disk: Option<DiskCache>,
}

impl LayeredCache {
    /// Builds a cache from the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let memory = match config.ttl {
            Some(ttl) => MemoryCache::with_capacity_and_ttl(config.max_size, ttl),
            None => MemoryCache::with_capacity(config.max_size),
        };
        Self {
            memory: Mutex::new(memory),
            disk: config.disk_dir.map(|dir| DiskCache::new(&dir)),
        }
    }

    /// An L1-only cache with default capacity. Convenient for tests and
    /// short-lived sessions.
    pub fn memory_only() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Returns `true` if the disk tier is enabled.
    pub fn disk_enabled(&self) -> bool {
        self.disk.is_some()
    }

    /// Looks up a key: L1 first, then L2 with promotion into L1.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(value) = self.lock_memory().get(key) {
            return Some(value);
        }
        let disk = self.disk.as_ref()?;
        let value = disk.get(key)?;
        self.lock_memory().put(key, value.clone());
        Some(value)
    }

    /// Writes a value to L1 and, when enabled, L2.
    ///
    /// A disk failure is reported but the L1 write stands; the value is
    /// cached for this session even if persistence is degraded.
    pub fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        if let Some(disk) = &self.disk {
            let result = disk.put(key, &value);
            self.lock_memory().put(key, value);
            result
        } else {
            self.lock_memory().put(key, value);
            Ok(())
        }
    }

    /// Removes a key from both tiers.
    pub fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.lock_memory().invalidate(key);
        if let Some(disk) = &self.disk {
            disk.invalidate(key)?;
        }
        Ok(())
    }

    /// Empties both tiers.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.lock_memory().clear();
        if let Some(disk) = &self.disk {
            disk.clear()?;
        }
        Ok(())
    }

    /// Composite statistics with both tiers visible independently.
    pub fn stats(&self) -> LayerStats {
        LayerStats {
            memory: self.lock_memory().stats(),
            disk: self.disk.as_ref().map(|d| d.stats()),
        }
    }

    fn lock_memory(&self) -> MutexGuard<'_, MemoryCache<Vec<u8>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk_config(dir: &std::path::Path) -> CacheConfig {
        CacheConfig {
            disk_dir: Some(dir.to_path_buf()),
            ..CacheConfig::default()
        }
    }

    #[test]
    fn memory_only_roundtrip() {
        let cache = LayeredCache::memory_only();
        cache.put("k", b"value".to_vec()).unwrap();
        assert_eq!(cache.get("k"), Some(b"value".to_vec()));
        assert!(!cache.disk_enabled());
    }

    #[test]
    fn miss_on_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LayeredCache::new(disk_config(dir.path()));
        assert_eq!(cache.get("absent"), None);

        let stats = cache.stats();
        assert_eq!(stats.memory.misses, 1);
        assert_eq!(stats.disk.unwrap().misses, 1);
    }

    #[test]
    fn put_writes_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LayeredCache::new(disk_config(dir.path()));
        cache.put("k", b"artifact".to_vec()).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.memory.size, 1);
        assert_eq!(stats.disk.unwrap().size, 1);
    }

    #[test]
    fn l2_hit_promotes_into_l1() {
        let dir = tempfile::tempdir().unwrap();

        // Seed only the disk tier via a previous session.
        {
            let cache = LayeredCache::new(disk_config(dir.path()));
            cache.put("k", b"artifact".to_vec()).unwrap();
        }

        let cache = LayeredCache::new(disk_config(dir.path()));

        // First get: L1 miss, L2 hit, promotion.
        assert_eq!(cache.get("k"), Some(b"artifact".to_vec()));
        let stats = cache.stats();
        assert_eq!(stats.memory.misses, 1);
        assert_eq!(stats.disk.unwrap().hits, 1);

        // Second get: served from L1, no further L2 access.
        assert_eq!(cache.get("k"), Some(b"artifact".to_vec()));
        let stats = cache.stats();
        assert_eq!(stats.memory.hits, 1);
        assert_eq!(stats.disk.unwrap().hits, 1, "disk hits unchanged");
    }

    #[test]
    fn invalidate_removes_from_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LayeredCache::new(disk_config(dir.path()));
        cache.put("k", b"artifact".to_vec()).unwrap();
        cache.invalidate("k").unwrap();

        assert_eq!(cache.get("k"), None);

        // A fresh instance sees no persisted value either.
        let fresh = LayeredCache::new(disk_config(dir.path()));
        assert_eq!(fresh.get("k"), None);
    }

    #[test]
    fn clear_empties_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LayeredCache::new(disk_config(dir.path()));
        cache.put("a", b"1".to_vec()).unwrap();
        cache.put("b", b"2".to_vec()).unwrap();
        cache.clear().unwrap();

        let stats = cache.stats();
        assert_eq!(stats.memory.size, 0);
        assert_eq!(stats.disk.unwrap().size, 0);
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;

        let cache = Arc::new(LayeredCache::memory_only());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    cache.put(&format!("k{i}"), vec![i as u8]).unwrap();
                }
            })
        };
        let reader = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let _ = cache.get(&format!("k{i}"));
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(cache.stats().memory.size, 100);
    }

    #[test]
    fn stats_expose_combined_rate() {
        let cache = LayeredCache::memory_only();
        cache.put("k", b"v".to_vec()).unwrap();
        cache.get("k");
        cache.get("absent");
        let stats = cache.stats();
        assert!((stats.combined_hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
