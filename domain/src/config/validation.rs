//! Structured configuration issues.
//!
//! Validation never fails fast: every problem found is reported as a
//! [`ConfigIssue`] so the caller can print all of them at once and decide
//! whether to continue (warnings) or abort (errors).
//!
//! # Examples
//!
//! ```
//! use docquorum_domain::config::{ConfigIssue, ConfigIssueCode, Severity, has_errors};
//!
//! let issues = vec![ConfigIssue::warning(
//!     ConfigIssueCode::ArbitratorAlsoEvaluates,
//!     "arbitrator 'alpha' also answers",
//! )];
//! assert!(!has_errors(&issues));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// Admission limits are inconsistent (e.g. zero queue depth).
    InvalidAdmission,
    /// Size bands or chunking options are inconsistent.
    InvalidChunking,
    /// Thresholds, bonuses or penalties are out of range.
    InvalidConsensus,
    /// No enabled provider is configured.
    NoProviders,
    /// More than three providers are enabled.
    TooManyProviders,
    /// A provider entry is unusable (empty command, zero context).
    InvalidProvider,
    /// `arbitrator` names a provider that does not exist or is disabled.
    UnknownArbitrator,
    /// The arbitrator also answers, so it judges its own answer.
    ArbitratorAlsoEvaluates,
    /// Several providers but no arbitrator: disagreements fall back.
    NoArbitrator,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

/// Whether any issue is fatal.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Wrap plain validation messages from a policy as issues of one code.
pub fn issues_from_messages(code: ConfigIssueCode, messages: Vec<String>) -> Vec<ConfigIssue> {
    messages
        .into_iter()
        .map(|message| ConfigIssue::error(code, message))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let warnings = vec![ConfigIssue::warning(ConfigIssueCode::NoArbitrator, "w")];
        assert!(!has_errors(&warnings));

        let mixed = vec![
            ConfigIssue::warning(ConfigIssueCode::NoArbitrator, "w"),
            ConfigIssue::error(ConfigIssueCode::NoProviders, "e"),
        ];
        assert!(has_errors(&mixed));
    }

    #[test]
    fn test_issues_from_messages() {
        let issues = issues_from_messages(
            ConfigIssueCode::InvalidAdmission,
            vec!["a".to_string(), "b".to_string()],
        );
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert_eq!(issues[1].to_string(), "error: b");
    }
}
