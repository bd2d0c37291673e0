//! Console output formatter for consensus decisions

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use docquorum_domain::{ConsensusDecision, SelectedSource};

/// Turn ANSI colors on or off for everything formatted afterwards.
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

/// Formats decisions for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the decision with every candidate answer
    pub fn format(decision: &ConsensusDecision) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("docquorum Decision"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Answer:".cyan().bold(),
            decision.final_answer.bold()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Confidence:".cyan().bold(),
            Self::confidence(decision.final_confidence)
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Source:".cyan().bold(),
            Self::source(decision.selected_source)
        ));
        output.push_str(&format!(
            "{} {:.2}\n",
            "Agreement:".cyan().bold(),
            decision.agreement_score
        ));

        if !decision.candidates.is_empty() {
            output.push_str(&Self::section_header("Candidate Answers"));
            for candidate in &decision.candidates {
                let label = format!("── {} ──", candidate.provider_id);
                let label = if candidate.is_usable() {
                    label.yellow().bold()
                } else {
                    label.red().bold()
                };
                output.push_str(&format!(
                    "\n{}\n{}\n{} {} ({} {:.2})\n",
                    label,
                    Self::indent(candidate.raw_text.trim(), "  "),
                    "  normalized:".dimmed(),
                    candidate.normalized_text,
                    "confidence".dimmed(),
                    candidate.confidence
                ));
            }
        }

        output.push_str(&Self::section_header("Reasoning"));
        output.push_str(&format!("\n{}\n", decision.reasoning));

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(decision: &ConsensusDecision) -> String {
        serde_json::to_string_pretty(decision).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the final answer only (concise output)
    pub fn format_summary(decision: &ConsensusDecision) -> String {
        format!(
            "{} {}\n{} {}  {} {}\n",
            "A:".bold(),
            decision.final_answer,
            "confidence".dimmed(),
            Self::confidence(decision.final_confidence),
            "source".dimmed(),
            Self::source(decision.selected_source)
        )
    }

    fn confidence(value: f64) -> String {
        let text = format!("{:.2}", value);
        if value >= 0.8 {
            text.green().to_string()
        } else if value >= 0.5 {
            text.yellow().to_string()
        } else {
            text.red().to_string()
        }
    }

    fn source(source: SelectedSource) -> String {
        if source.is_degraded() {
            format!("{} {}", source.as_str().yellow(), "(degraded)".dimmed())
        } else {
            source.as_str().to_string()
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, decision: &ConsensusDecision) -> String {
        Self::format(decision)
    }

    fn format_json(&self, decision: &ConsensusDecision) -> String {
        Self::format_json(decision)
    }

    fn format_summary(&self, decision: &ConsensusDecision) -> String {
        Self::format_summary(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquorum_domain::{AnswerType, ModelAnswer, OutputFormat};

    fn decision() -> ConsensusDecision {
        ConsensusDecision::new(
            "NO",
            0.72,
            SelectedSource::Arbitrated,
            0.0,
            "The flood exclusion in section 4 applies.",
        )
        .with_candidates(vec![
            ModelAnswer::new("alpha", "Yes", 0.9, AnswerType::Boolean),
            ModelAnswer::new("beta", "No", 0.85, AnswerType::Boolean),
        ])
    }

    #[test]
    fn test_full_lists_candidates() {
        set_color_enabled(false);
        let output = ConsoleFormatter::format(&decision());
        assert!(output.contains("Answer: NO"));
        assert!(output.contains("Source: arbitrated"));
        assert!(output.contains("── alpha ──"));
        assert!(output.contains("── beta ──"));
        assert!(output.contains("flood exclusion"));
    }

    #[test]
    fn test_summary_marks_degraded_source() {
        set_color_enabled(false);
        let fallback = ConsensusDecision::new("YES", 0.6, SelectedSource::SingleFallback, 0.0, "");
        let output = ConsoleFormatter::format_summary(&fallback);
        assert!(output.starts_with("A: YES"));
        assert!(output.contains("single-fallback (degraded)"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = ConsoleFormatter.render(&decision(), OutputFormat::Json);
        let parsed: ConsensusDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decision());
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
