//! Configuration file loading for docquorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./docquorum.toml` or `./.docquorum.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/docquorum/config.toml`
//! 4. `DOCQUORUM_` environment variables
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAdmissionConfig, FileAdmissionOverride, FileChunkingConfig, FileConfig,
    FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileSizeBand,
    MAX_ANSWERING_PROVIDERS,
};
pub use loader::{ConfigLoader, ENV_PREFIX};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(Box<figment::Error>),
}
