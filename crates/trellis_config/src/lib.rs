//! Configuration loading for the Trellis cache subsystem.
//!
//! Projects configure the cache and build behavior in `trellis.toml`.
//! Loading validates eagerly: an unknown strategy name, a zero cache
//! size, or a malformed pattern fails fast, before any build work.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{BuildOptions, CacheOptions, TrellisConfig};
