//! Response parsing for provider answers and arbitrator verdicts.
//!
//! Pure text pattern matching over free-form model output.
//!
//! | Function | Input | Keys |
//! |----------|-------|------|
//! | [`parse_answer_reply`] | extraction reply | ANSWER / CONFIDENCE |
//! | [`parse_verdict`] | arbitration reply | DECISION / CONFIDENCE / REASONING / ANSWER |
//!
//! Both accept either a JSON object (optionally inside a code fence) or
//! `KEY: value` lines.

use super::error::ArbitrationError;
use super::verdict::{ArbitrationChoice, ArbitrationVerdict, candidate_index};
use crate::core::string::truncate;
use regex::Regex;
use std::sync::LazyLock;

static RE_KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*[*_#>\- \t]*(answer|confidence|decision|choice|verdict|reasoning|reason)[*_]*[ \t]*[:=][ \t]*(.*)$")
        .expect("valid key line regex")
});

static RE_CONFIDENCE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?|\.\d+)\s*(%)?").expect("valid confidence regex"));

/// Answer and optional confidence read from an extraction reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub answer: String,
    pub confidence: Option<f64>,
}

/// Parse an extraction reply.
///
/// Falls back to the whole reply as the answer when no `ANSWER` key is
/// present.
///
/// # Examples
///
/// ```
/// use docquorum_domain::consensus::parsing::parse_answer_reply;
///
/// let reply = parse_answer_reply("ANSWER: Yes\nCONFIDENCE: 85%");
/// assert_eq!(reply.answer, "Yes");
/// assert_eq!(reply.confidence, Some(0.85));
///
/// let json = parse_answer_reply(r#"{"answer": 2500, "confidence": 0.9}"#);
/// assert_eq!(json.answer, "2500");
/// ```
pub fn parse_answer_reply(response: &str) -> ParsedReply {
    if let Some(obj) = extract_json_object(response) {
        let answer = obj.get("answer").and_then(value_to_text);
        if let Some(answer) = answer {
            return ParsedReply {
                answer,
                confidence: obj.get("confidence").and_then(value_to_confidence),
            };
        }
    }

    let fields = key_lines(response);
    let confidence = fields
        .iter()
        .find(|(k, _)| k == "confidence")
        .and_then(|(_, v)| parse_confidence(v));

    let answer = match fields.iter().position(|(k, _)| k == "answer") {
        Some(i) if !fields[i].1.is_empty() => fields[i].1.clone(),
        Some(_) => line_after_key(response, "answer").unwrap_or_default(),
        None => response
            .lines()
            .filter(|line| !RE_KEY_LINE.is_match(line))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
    };

    ParsedReply { answer, confidence }
}

/// Parse an arbitrator reply for `candidate_count` candidates.
///
/// # Examples
///
/// ```
/// use docquorum_domain::consensus::parsing::parse_verdict;
/// use docquorum_domain::consensus::verdict::ArbitrationChoice;
///
/// let verdict = parse_verdict("DECISION: B\nCONFIDENCE: 0.88\nREASONING: Clause 4", 2).unwrap();
/// assert_eq!(verdict.choice, ArbitrationChoice::Candidate(1));
/// assert_eq!(verdict.confidence, Some(0.88));
/// ```
pub fn parse_verdict(
    response: &str,
    candidate_count: usize,
) -> Result<ArbitrationVerdict, ArbitrationError> {
    let (decision, answer, confidence, reasoning) = match extract_json_object(response) {
        Some(obj) => {
            let decision = ["decision", "choice", "verdict"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(value_to_text));
            (
                decision,
                obj.get("answer").and_then(value_to_text),
                obj.get("confidence").and_then(value_to_confidence),
                obj.get("reasoning")
                    .or_else(|| obj.get("reason"))
                    .and_then(value_to_text)
                    .unwrap_or_default(),
            )
        }
        None => {
            let fields = key_lines(response);
            let get = |keys: &[&str]| {
                fields
                    .iter()
                    .find(|(k, _)| keys.contains(&k.as_str()))
                    .map(|(_, v)| v.clone())
            };
            (
                get(&["decision", "choice", "verdict"]),
                get(&["answer"]).filter(|a| !a.is_empty()),
                get(&["confidence"]).and_then(|v| parse_confidence(&v)),
                get(&["reasoning", "reason"]).unwrap_or_default(),
            )
        }
    };

    let decision = decision
        .ok_or_else(|| ArbitrationError::Unparseable(truncate(response.trim(), 200)))?;
    let token = decision
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string();

    let choice = if token.to_uppercase().starts_with("SYNTH") {
        let answer = answer
            .filter(|a| !a.trim().is_empty())
            .ok_or(ArbitrationError::MissingSynthesis)?;
        ArbitrationChoice::Synthesized(answer.trim().to_string())
    } else {
        let label = token
            .strip_prefix("Candidate")
            .or_else(|| token.strip_prefix("CANDIDATE"))
            .unwrap_or(&token)
            .trim();
        let index = candidate_index(label, candidate_count)
            .ok_or_else(|| ArbitrationError::InvalidChoice(token.clone()))?;
        ArbitrationChoice::Candidate(index)
    };

    Ok(ArbitrationVerdict {
        choice,
        confidence,
        reasoning,
    })
}

/// Read a confidence such as `0.85`, `.85`, `85%` or `85`.
pub fn parse_confidence(text: &str) -> Option<f64> {
    let caps = RE_CONFIDENCE_VALUE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let value = if caps.get(2).is_some() || value > 1.0 {
        value / 100.0
    } else {
        value
    };
    (0.0..=1.0).contains(&value).then_some(value)
}

fn key_lines(response: &str) -> Vec<(String, String)> {
    RE_KEY_LINE
        .captures_iter(response)
        .map(|caps| {
            let key = caps[1].to_lowercase();
            let value = caps[2].trim().trim_matches('*').trim().to_string();
            (key, value)
        })
        .collect()
}

/// First non-empty line following a bare `KEY:` line.
fn line_after_key(response: &str, key: &str) -> Option<String> {
    let mut lines = response.lines();
    lines.find(|line| {
        RE_KEY_LINE
            .captures(line)
            .is_some_and(|caps| caps[1].eq_ignore_ascii_case(key))
    })?;
    lines
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn extract_json_object(response: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(&response[start..=end]) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(if *b { "YES" } else { "NO" }.to_string()),
        _ => None,
    }
}

fn value_to_confidence(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(|v| parse_confidence(&v.to_string())),
        serde_json::Value::String(s) => parse_confidence(s),
        _ => None,
    }
}
