//! Configuration types deserialized from `trellis.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use trellis_cache::CacheConfig;
use trellis_common::SignatureStrategy;

use crate::error::ConfigError;

/// The top-level configuration parsed from `trellis.toml`.
///
/// Both sections are optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TrellisConfig {
    /// Cache tier settings.
    #[serde(default)]
    pub cache: CacheOptions,

    /// Change detection and policy-scan settings.
    #[serde(default)]
    pub build: BuildOptions,
}

/// Settings for the layered artifact cache.
#[derive(Debug, Deserialize)]
pub struct CacheOptions {
    /// Memory-tier capacity in entries.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Optional memory-tier entry lifetime in milliseconds.
    #[serde(default)]
    pub ttl_ms: Option<u64>,

    /// Whether the persistent disk tier is enabled.
    #[serde(default)]
    pub disk_enabled: bool,

    /// Directory for the disk tier and the graph manifest.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            ttl_ms: None,
            disk_enabled: false,
            cache_dir: default_cache_dir(),
        }
    }
}

impl CacheOptions {
    /// Maps these options to the cache crate's construction parameters.
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.max_size,
            ttl: self.ttl_ms.map(Duration::from_millis),
            disk_dir: self
                .disk_enabled
                .then(|| PathBuf::from(&self.cache_dir)),
        }
    }

    /// Where the graph manifest is persisted.
    pub fn graph_manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir).join("graph.json")
    }
}

/// Settings for change detection and policy scans.
#[derive(Debug, Deserialize)]
pub struct BuildOptions {
    /// Default change-detection strategy name.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Whether policy scans invalidate automatically.
    #[serde(default)]
    pub auto_invalidate: bool,

    /// Directories scanned by invalidation policies.
    #[serde(default)]
    pub watch_dirs: Vec<String>,

    /// Filename patterns selecting scan candidates.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            auto_invalidate: false,
            watch_dirs: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl BuildOptions {
    /// Parses the configured strategy name.
    pub fn signature_strategy(&self) -> Result<SignatureStrategy, ConfigError> {
        self.strategy
            .parse()
            .map_err(|_| ConfigError::InvalidStrategy(self.strategy.clone()))
    }
}

fn default_max_size() -> usize {
    1000
}

fn default_cache_dir() -> String {
    ".trellis-cache".to_string()
}

fn default_strategy() -> String {
    "content-hash".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrellisConfig::default();
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.cache.ttl_ms, None);
        assert!(!config.cache.disk_enabled);
        assert_eq!(config.cache.cache_dir, ".trellis-cache");
        assert_eq!(config.build.strategy, "content-hash");
        assert!(!config.build.auto_invalidate);
    }

    #[test]
    fn to_cache_config_disk_disabled() {
        let options = CacheOptions::default();
        let cc = options.to_cache_config();
        assert_eq!(cc.max_size, 1000);
        assert!(cc.ttl.is_none());
        assert!(cc.disk_dir.is_none());
    }

    #[test]
    fn to_cache_config_disk_enabled() {
        let options = CacheOptions {
            disk_enabled: true,
            ttl_ms: Some(30_000),
            ..CacheOptions::default()
        };
        let cc = options.to_cache_config();
        assert_eq!(cc.ttl, Some(Duration::from_secs(30)));
        assert_eq!(cc.disk_dir, Some(PathBuf::from(".trellis-cache")));
    }

    #[test]
    fn graph_manifest_under_cache_dir() {
        let options = CacheOptions::default();
        assert_eq!(
            options.graph_manifest_path(),
            PathBuf::from(".trellis-cache/graph.json")
        );
    }

    #[test]
    fn strategy_parses() {
        let build = BuildOptions {
            strategy: "timestamp".to_string(),
            ..BuildOptions::default()
        };
        assert_eq!(
            build.signature_strategy().unwrap(),
            SignatureStrategy::Mtime
        );
    }

    #[test]
    fn bad_strategy_errors() {
        let build = BuildOptions {
            strategy: "sha1".to_string(),
            ..BuildOptions::default()
        };
        assert!(matches!(
            build.signature_strategy(),
            Err(ConfigError::InvalidStrategy(_))
        ));
    }
}
