//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `trellis.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A strategy name is not one of the recognized set.
    #[error("unknown strategy '{0}' (expected 'content-hash' or 'timestamp')")]
    InvalidStrategy(String),

    /// A configuration value failed validation.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),
}
