//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// decision_log = "~/.local/share/docquorum/decisions.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file that every decision is appended to
    pub decision_log: Option<String>,
}

impl FileLoggingConfig {
    /// Decision log path with a leading `~` expanded.
    pub fn decision_log_path(&self) -> Option<PathBuf> {
        let raw = self.decision_log.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return Some(home.join(rest));
        }
        Some(PathBuf::from(raw))
    }
}
