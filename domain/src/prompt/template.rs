//! Prompt templates for extraction and arbitration

use crate::chunking::chunk::DocumentChunk;
use crate::consensus::answer::ModelAnswer;
use crate::consensus::answer_type::AnswerType;
use crate::consensus::verdict::candidate_label;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for answer extraction
    pub fn extraction_system() -> &'static str {
        r#"You are a careful analyst answering questions about insurance and legal documents.
Answer only from the document excerpts you are given. Do not guess.
If the excerpts do not contain the answer, say so and give a low confidence."#
    }

    /// User prompt asking one provider to answer from `chunks`
    ///
    /// Chunks are presented in the order given, each labelled with its byte
    /// range so answers can cite where they came from.
    pub fn extraction_prompt(
        question: &str,
        answer_type: AnswerType,
        chunks: &[&DocumentChunk],
    ) -> String {
        let mut prompt = format!(
            r#"Question: {}

Document excerpts:
"#,
            question
        );

        for chunk in chunks {
            prompt.push_str(&format!(
                "\n--- bytes {}..{} ---\n{}\n",
                chunk.start_offset, chunk.end_offset, chunk.content
            ));
        }

        prompt.push_str(&format!(
            r#"
{}
Reply in exactly this format:
ANSWER: <your answer>
CONFIDENCE: <a number between 0 and 1>"#,
            answer_type.format_hint()
        ));

        prompt
    }

    /// System prompt for the arbitrator
    pub fn arbitration_system() -> &'static str {
        r#"You are an impartial arbitrator resolving disagreements between independent analysts.
Check each candidate answer against the document excerpt and pick the one it supports.
If none is fully correct, write the correct answer yourself."#
    }

    /// User prompt asking the arbitrator to settle `candidates`
    pub fn arbitration_prompt(
        question: &str,
        answer_type: AnswerType,
        candidates: &[ModelAnswer],
        excerpt: &str,
        severity: &str,
    ) -> String {
        let mut prompt = format!(
            r#"Question: {}

The analysts' answers show {}.

Candidate answers:
"#,
            question, severity
        );

        for (i, candidate) in candidates.iter().enumerate() {
            prompt.push_str(&format!(
                "\n{}. {} (confidence {:.2})\n",
                candidate_label(i),
                candidate.raw_text.trim(),
                candidate.confidence
            ));
        }

        if !excerpt.is_empty() {
            prompt.push_str(&format!("\nDocument excerpt:\n{}\n", excerpt));
        }

        let labels: Vec<String> = (0..candidates.len())
            .map(|i| candidate_label(i).to_string())
            .collect();
        prompt.push_str(&format!(
            r#"
{}
Reply in exactly this format:
DECISION: <{} or SYNTHESIZED>
ANSWER: <the answer, required when SYNTHESIZED>
CONFIDENCE: <a number between 0 and 1>
REASONING: <one or two sentences>"#,
            answer_type.format_hint(),
            labels.join(", ")
        ));

        prompt
    }
}
