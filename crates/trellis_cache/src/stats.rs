//! Cache hit/miss/eviction accounting.

use serde::{Deserialize, Serialize};

/// Counters for one cache tier.
///
/// All counters except `size` are monotonically non-decreasing within a
/// process lifetime. `size` is the current entry count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found a live entry.
    pub hits: u64,

    /// Lookups that found nothing (including TTL expiries).
    pub misses: u64,

    /// Entries removed by capacity pressure or TTL expiry.
    pub evictions: u64,

    /// Values written.
    pub puts: u64,

    /// Current number of entries in the tier.
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, in `[0.0, 1.0]`. Zero lookups is 0.0.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Composite statistics for a layered cache: both tiers visible
/// independently plus a combined hit rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayerStats {
    /// The in-memory (L1) tier.
    pub memory: CacheStats,

    /// The disk (L2) tier, when enabled.
    pub disk: Option<CacheStats>,
}

impl LayerStats {
    /// Hit rate across both tiers combined.
    ///
    /// A lookup that missed L1 but hit L2 counts as one hit; the L1 miss
    /// it implies is not double-counted against the caller.
    pub fn combined_hit_rate(&self) -> f64 {
        let (hits, total) = match self.disk {
            // Every L1 miss fell through to the disk tier, where it was
            // counted again as either a hit or a terminal miss.
            Some(disk) => (
                self.memory.hits + disk.hits,
                self.memory.hits + disk.hits + disk.misses,
            ),
            None => (self.memory.hits, self.memory.hits + self.memory.misses),
        };
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_zero_when_untouched() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_fraction() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn combined_rate_memory_only() {
        let layer = LayerStats {
            memory: CacheStats {
                hits: 1,
                misses: 1,
                ..Default::default()
            },
            disk: None,
        };
        assert!((layer.combined_hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn combined_rate_counts_l2_hits() {
        // One lookup hit L1, one fell through and hit L2, one missed both.
        let layer = LayerStats {
            memory: CacheStats {
                hits: 1,
                misses: 2,
                ..Default::default()
            },
            disk: Some(CacheStats {
                hits: 1,
                misses: 1,
                ..Default::default()
            }),
        };
        let rate = layer.combined_hit_rate();
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn serde_roundtrip() {
        let stats = CacheStats {
            hits: 5,
            misses: 2,
            evictions: 1,
            puts: 6,
            size: 4,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: CacheStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }
}
