//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::TrellisConfig;

/// Loads and validates a `trellis.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<TrellisConfig, ConfigError> {
    let config_path = project_dir.join("trellis.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<TrellisConfig, ConfigError> {
    let config: TrellisConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates values the type system cannot: strategy names, bounds,
/// and the coupling between auto-invalidation and its patterns.
fn validate_config(config: &TrellisConfig) -> Result<(), ConfigError> {
    config.build.signature_strategy()?;

    if config.cache.max_size == 0 {
        return Err(ConfigError::InvalidValue(
            "cache.max_size must be positive".to_string(),
        ));
    }
    if config.cache.cache_dir.is_empty() {
        return Err(ConfigError::MissingField("cache.cache_dir".to_string()));
    }

    if config.build.patterns.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidValue(
            "build.patterns must not contain empty patterns".to_string(),
        ));
    }
    if config.build.auto_invalidate && config.build.patterns.is_empty() {
        return Err(ConfigError::MissingField("build.patterns".to_string()));
    }

    Ok(())
}
