//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod admission;
mod chunking;
mod logging;
mod output;
mod providers;

pub use admission::{FileAdmissionConfig, FileAdmissionOverride};
pub use chunking::{FileChunkingConfig, FileSizeBand};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use providers::FileProviderConfig;

use docquorum_application::ExecutionParams;
use docquorum_domain::{
    AdmissionPolicy, ConfigIssue, ConfigIssueCode, ConsensusPolicy, config::issues_from_messages,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most providers that may answer one question.
pub const MAX_ANSWERING_PROVIDERS: usize = 3;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider id that settles disagreements
    pub arbitrator: Option<String>,
    /// Admission limits shared by all providers
    pub admission: FileAdmissionConfig,
    pub chunking: FileChunkingConfig,
    /// Thresholds, bonuses and penalties of the consensus engine
    pub consensus: ConsensusPolicy,
    /// Per-call model parameters
    pub execution: ExecutionParams,
    /// Providers by id, evaluated in id order
    pub providers: BTreeMap<String, FileProviderConfig>,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Enabled providers that answer questions, in id order.
    pub fn answering_providers(&self) -> impl Iterator<Item = (&String, &FileProviderConfig)> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled && p.answers)
    }

    /// The enabled arbitrator entry, if one is configured.
    pub fn arbitrator_provider(&self) -> Option<(&String, &FileProviderConfig)> {
        let id = self.arbitrator.as_ref()?;
        self.providers
            .get_key_value(id)
            .filter(|(_, p)| p.enabled)
    }

    /// Admission policy for one provider: the global section with the
    /// provider's overrides applied.
    pub fn admission_for(
        &self,
        provider: &FileProviderConfig,
    ) -> (AdmissionPolicy, Vec<ConfigIssue>) {
        match &provider.admission {
            Some(overrides) => self.admission.merged(overrides).to_policy(),
            None => self.admission.to_policy(),
        }
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Admission, chunking and consensus values
    /// 2. Every enabled provider entry
    /// 3. How many providers answer, and who arbitrates
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Section values
        issues.extend(self.admission.to_policy().1);
        issues.extend(self.chunking.to_options().1);
        issues.extend(issues_from_messages(
            ConfigIssueCode::InvalidConsensus,
            self.consensus.validate(),
        ));

        // 2. Provider entries
        for (id, provider) in self.providers.iter().filter(|(_, p)| p.enabled) {
            issues.extend(provider.validate(id));
            if provider.admission.is_some() {
                issues.extend(self.admission_for(provider).1.into_iter().map(|mut issue| {
                    issue.message = format!("providers.{}: {}", id, issue.message);
                    issue
                }));
            }
        }

        // 3. Provider count and arbitration
        let answering: Vec<&String> = self.answering_providers().map(|(id, _)| id).collect();
        if answering.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoProviders,
                "no enabled provider answers questions; add a [providers.<id>] table",
            ));
        } else if answering.len() > MAX_ANSWERING_PROVIDERS {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TooManyProviders,
                format!(
                    "{} providers answer questions ({}); at most {} are supported",
                    answering.len(),
                    answering
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    MAX_ANSWERING_PROVIDERS
                ),
            ));
        }

        match &self.arbitrator {
            Some(id) => match self.arbitrator_provider() {
                None => issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownArbitrator,
                    format!("arbitrator '{}' is not an enabled provider", id),
                )),
                Some((_, provider)) if provider.answers => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::ArbitratorAlsoEvaluates,
                    format!(
                        "arbitrator '{}' also answers questions and will judge its own answer; set answers = false on it",
                        id
                    ),
                )),
                Some(_) => {}
            },
            None if answering.len() > 1 => issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoArbitrator,
                "no arbitrator configured; disagreements fall back to the most confident answer",
            )),
            None => {}
        }

        issues
    }
}
