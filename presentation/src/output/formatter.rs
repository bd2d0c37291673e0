//! Output formatter trait

use docquorum_domain::{ConsensusDecision, OutputFormat};

/// Trait for formatting consensus decisions
pub trait OutputFormatter {
    /// Format the decision with every candidate answer
    fn format(&self, decision: &ConsensusDecision) -> String;

    /// Format as JSON
    fn format_json(&self, decision: &ConsensusDecision) -> String;

    /// Format the final answer only (concise output)
    fn format_summary(&self, decision: &ConsensusDecision) -> String;

    /// Format in the requested style
    fn render(&self, decision: &ConsensusDecision, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(decision),
            OutputFormat::Summary => self.format_summary(decision),
            OutputFormat::Json => self.format_json(decision),
        }
    }
}
