//! Provider configuration from TOML (`[providers.<id>]` tables)

use super::admission::FileAdmissionOverride;
use docquorum_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One provider backed by an external command.
///
/// # Example
///
/// ```toml
/// [providers.claude]
/// command = "llm-bridge"
/// args = ["--vendor", "anthropic"]
/// model = "claude-sonnet"
/// context_tokens = 200000
///
/// [providers.claude.admission]
/// requests_per_minute = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Program to run for each call
    pub command: String,
    pub args: Vec<String>,
    /// Model name passed to the command
    pub model: String,
    /// Context window of the model in tokens
    pub context_tokens: usize,
    /// Per-call timeout
    pub timeout_secs: u64,
    pub enabled: bool,
    /// Whether this provider answers questions. An arbitrator-only entry
    /// sets this to false.
    pub answers: bool,
    /// Overrides of the global `[admission]` section
    pub admission: Option<FileAdmissionOverride>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            model: String::new(),
            context_tokens: 128_000,
            timeout_secs: 120,
            enabled: true,
            answers: true,
            admission: None,
        }
    }
}

impl FileProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check a single entry.
    pub fn validate(&self, id: &str) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.command.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidProvider,
                format!("providers.{}: command cannot be empty", id),
            ));
        } else if which::which(&self.command).is_err() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidProvider,
                format!(
                    "providers.{}: command '{}' was not found on PATH",
                    id, self.command
                ),
            ));
        }
        if self.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidProvider,
                format!("providers.{}: model cannot be empty", id),
            ));
        }
        if self.context_tokens == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidProvider,
                format!("providers.{}: context_tokens must be > 0", id),
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidProvider,
                format!("providers.{}: timeout_secs cannot be 0", id),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_provider_table() {
        let toml_str = r#"
[providers.alpha]
command = "sh"
args = ["-c", "cat"]
model = "alpha-1"
context_tokens = 32000

[providers.alpha.admission]
requests_per_minute = 5
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let alpha = &config.providers["alpha"];
        assert_eq!(alpha.command, "sh");
        assert_eq!(alpha.args, vec!["-c", "cat"]);
        assert_eq!(alpha.context_tokens, 32_000);
        assert!(alpha.enabled);
        assert!(alpha.answers);
        assert_eq!(alpha.timeout(), Duration::from_secs(120));
        assert_eq!(
            alpha.admission.as_ref().unwrap().requests_per_minute,
            Some(5)
        );
    }

    #[test]
    fn test_validate_empty_fields() {
        let issues = FileProviderConfig {
            context_tokens: 0,
            ..Default::default()
        }
        .validate("alpha");
        // command, model, context_tokens
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.code == ConfigIssueCode::InvalidProvider));
        assert!(issues[0].message.starts_with("providers.alpha:"));
    }

    #[test]
    fn test_validate_missing_command_is_warning() {
        let issues = FileProviderConfig {
            command: "docquorum-no-such-program".to_string(),
            model: "m".to_string(),
            ..Default::default()
        }
        .validate("alpha");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, docquorum_domain::Severity::Warning);
    }
}
