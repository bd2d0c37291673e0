//! Configuration file loader with multi-source merging

use super::ConfigError;
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix; `__` separates nested keys
/// (`DOCQUORUM_ADMISSION__REQUESTS_PER_MINUTE=10`).
pub const ENV_PREFIX: &str = "DOCQUORUM_";

const PROJECT_FILENAMES: [&str; 2] = ["docquorum.toml", ".docquorum.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./docquorum.toml` or `./.docquorum.toml`
    /// 3. Global: `$XDG_CONFIG_HOME/docquorum/config.toml`
    /// 4. `DOCQUORUM_` environment variables
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();
        Self::load_from(config_path, project.as_deref(), global.as_deref())
    }

    /// Load from explicit sources, with environment variables and defaults
    /// underneath.
    pub fn load_from(
        explicit: Option<&Path>,
        project: Option<&Path>,
        global: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        for path in [global, project].into_iter().flatten() {
            debug!("Merging configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = explicit {
            // A missing file here is a user error, not an absent layer
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            debug!("Merging configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/docquorum/config.toml if set,
    /// otherwise falls back to ~/.config/docquorum/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docquorum").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILENAMES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used, in priority order
    pub fn describe_sources(explicit: Option<&Path>) -> Vec<String> {
        let mut lines = Vec::new();
        let mark = |found: bool| if found { "[FOUND]" } else { "[     ]" };

        if let Some(path) = explicit {
            lines.push(format!("{} Explicit: {}", mark(path.exists()), path.display()));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(format!("{} Project: {}", mark(true), path.display())),
            None => lines.push(format!(
                "{} Project: ./docquorum.toml or ./.docquorum.toml",
                mark(false)
            )),
        }
        if let Some(path) = Self::global_config_path() {
            lines.push(format!("{} Global:  {}", mark(path.exists()), path.display()));
        }
        lines.push(format!("        Env:     {}*", ENV_PREFIX));
        lines.push("        Default: built-in defaults".to_string());
        lines
    }
}
