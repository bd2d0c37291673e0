//! Expected answer types and their normalization

use crate::core::error::DomainError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|[a-z]{3,9}\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}\s+[a-z]{3,9}\.?,?\s+\d{4})\b",
    )
    .expect("valid date regex")
});

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-)?\$?\s?(\d[\d,]*(?:\.\d+)?|\.\d+)\s*(k|thousand|m|mm|million|b|bn|billion)?\b")
        .expect("valid number regex")
});

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").expect("valid ordinal regex"));

const YES_WORDS: &[&str] = &[
    "YES", "TRUE", "COVERED", "INCLUDED", "CORRECT", "AFFIRMATIVE",
];
const NO_WORDS: &[&str] = &[
    "NO", "FALSE", "NOT", "NONE", "EXCLUDED", "NEGATIVE",
];

pub const YES: &str = "YES";
pub const NO: &str = "NO";
pub const UNKNOWN: &str = "UNKNOWN";

/// Canonical date format of normalized date answers.
pub const DATE_FORMAT: &str = "%m-%d-%y";

/// Type of answer a question expects.
///
/// Drives normalization and the agreement measure used when comparing
/// answers from different providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Boolean,
    Date,
    Number,
    #[default]
    Text,
}

impl AnswerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::Boolean => "boolean",
            AnswerType::Date => "date",
            AnswerType::Number => "number",
            AnswerType::Text => "text",
        }
    }

    /// Formatting instruction appended to extraction prompts.
    pub fn format_hint(&self) -> &'static str {
        match self {
            AnswerType::Boolean => "Answer YES or NO.",
            AnswerType::Date => "Answer with a single date formatted MM/DD/YYYY.",
            AnswerType::Number => "Answer with a single number, without units or commentary.",
            AnswerType::Text => "Answer in as few words as possible.",
        }
    }

    /// Canonical form of a raw answer.
    ///
    /// Dates and numbers that cannot be parsed fall back to text
    /// normalization so they still compare by token overlap.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            AnswerType::Boolean => normalize_boolean(raw).to_string(),
            AnswerType::Date => parse_date(raw)
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| normalize_text(raw)),
            AnswerType::Number => parse_number(raw)
                .map(format_number)
                .unwrap_or_else(|| normalize_text(raw)),
            AnswerType::Text => normalize_text(raw),
        }
    }
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boolean" | "bool" | "yes-no" | "yesno" => Ok(AnswerType::Boolean),
            "date" => Ok(AnswerType::Date),
            "number" | "numeric" | "amount" => Ok(AnswerType::Number),
            "text" | "string" => Ok(AnswerType::Text),
            other => Err(DomainError::InvalidAnswerType(other.to_string())),
        }
    }
}

/// YES, NO or UNKNOWN by keyword containment; the first keyword wins.
pub fn normalize_boolean(raw: &str) -> &'static str {
    let upper = raw.to_uppercase();
    for word in upper.split(|c: char| !c.is_alphanumeric()) {
        if YES_WORDS.contains(&word) {
            return YES;
        }
        if NO_WORDS.contains(&word) {
            return NO;
        }
    }
    UNKNOWN
}

/// Trimmed, lower-cased, whitespace collapsed.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First date found in `raw`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    RE_DATE
        .find_iter(raw)
        .find_map(|m| parse_date_token(m.as_str()))
}

fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let cleaned = RE_ORDINAL.replace_all(token, "$1");
    let cleaned: String = cleaned
        .replace([',', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        || cleaned.chars().last().is_some_and(|c| c.is_ascii_digit()) && cleaned.contains(' ')
    {
        return ["%B %d %Y", "%d %B %Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok());
    }

    let numeric = token.replace(['/', '.'], "-");
    let parts: Vec<&str> = numeric.split('-').collect();
    let format = match parts.as_slice() {
        [y, _, _] if y.len() == 4 => "%Y-%m-%d",
        [_, _, y] if y.len() == 4 => "%m-%d-%Y",
        [_, _, y] if y.len() == 2 => "%m-%d-%y",
        _ => return None,
    };
    NaiveDate::parse_from_str(&numeric, format).ok()
}

/// First number found in `raw`, with thousand/million/billion suffixes
/// applied.
pub fn parse_number(raw: &str) -> Option<f64> {
    let caps = RE_NUMBER.captures(raw)?;
    let digits = caps.get(2)?.as_str().replace(',', "");
    let mut value: f64 = digits.parse().ok()?;
    if let Some(suffix) = caps.get(3) {
        value *= match suffix.as_str().to_lowercase().as_str() {
            "k" | "thousand" => 1e3,
            "m" | "mm" | "million" => 1e6,
            _ => 1e9,
        };
    }
    if caps.get(1).is_some() {
        value = -value;
    }
    Some(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
