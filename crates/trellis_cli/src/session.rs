//! Shared session setup: config, cache, and graph loading.

use std::path::{Path, PathBuf};

use trellis_cache::LayeredCache;
use trellis_config::TrellisConfig;
use trellis_graph::DependencyGraph;

use crate::GlobalArgs;

/// A loaded project session: configuration, cache, and graph.
pub struct Session {
    /// The parsed project configuration.
    pub config: TrellisConfig,

    /// The layered artifact cache, tiers per the configuration.
    pub cache: LayeredCache,

    /// The dependency graph, loaded from the persisted manifest when
    /// one exists, otherwise empty.
    pub graph: DependencyGraph,
}

impl Session {
    /// Opens a session for the resolved project directory.
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let project_dir = resolve_project_dir(global);
        let config = trellis_config::load_config(&project_dir)?;

        let cache = LayeredCache::new(config.cache.to_cache_config());
        let graph = DependencyGraph::load(&config.cache.graph_manifest_path())
            .unwrap_or_default();

        Ok(Self {
            config,
            cache,
            graph,
        })
    }

    /// Persists the graph manifest back to the cache directory.
    pub fn save_graph(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.graph
            .save(&self.config.cache.graph_manifest_path())?;
        Ok(())
    }
}

fn resolve_project_dir(global: &GlobalArgs) -> PathBuf {
    match &global.project {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(".").to_path_buf(),
    }
}
