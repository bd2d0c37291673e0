//! Continuous agreement between normalized answers

use super::answer_type::{AnswerType, DATE_FORMAT, parse_number};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Agreement of two normalized answers in `[0, 1]`.
///
/// - Boolean: 1 when equal, so UNKNOWN never agrees with YES or NO
/// - Date: fraction of matching year/month/day fields
/// - Number: 1 within `number_tolerance` relative difference, decaying
///   linearly with the difference beyond it
/// - Text: token Jaccard similarity
pub fn agreement(answer_type: AnswerType, a: &str, b: &str, number_tolerance: f64) -> f64 {
    match answer_type {
        AnswerType::Boolean => {
            if a == b {
                1.0
            } else {
                0.0
            }
        }
        AnswerType::Date => match (parse_canonical_date(a), parse_canonical_date(b)) {
            (Some(x), Some(y)) => date_agreement(x, y),
            _ => jaccard(a, b),
        },
        AnswerType::Number => match (parse_number(a), parse_number(b)) {
            (Some(x), Some(y)) => number_agreement(x, y, number_tolerance),
            _ => jaccard(a, b),
        },
        AnswerType::Text => jaccard(a, b),
    }
}

/// Mean agreement over every pair of answers. A single answer agrees with
/// itself.
pub fn mean_pairwise_agreement(
    answer_type: AnswerType,
    normalized: &[&str],
    number_tolerance: f64,
) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in normalized.iter().enumerate() {
        for b in &normalized[i + 1..] {
            total += agreement(answer_type, a, b, number_tolerance);
            pairs += 1;
        }
    }
    if pairs == 0 { 1.0 } else { total / pairs as f64 }
}

/// Index of the answer that agrees most with the others (first on ties).
pub fn most_agreed(answer_type: AnswerType, normalized: &[&str], number_tolerance: f64) -> usize {
    let mut best = 0;
    let mut best_total = f64::MIN;
    for (i, a) in normalized.iter().enumerate() {
        let total: f64 = normalized
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, b)| agreement(answer_type, a, b, number_tolerance))
            .sum();
        if total > best_total {
            best = i;
            best_total = total;
        }
    }
    best
}

fn parse_canonical_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn date_agreement(a: NaiveDate, b: NaiveDate) -> f64 {
    let matching = [a.year() == b.year(), a.month() == b.month(), a.day() == b.day()]
        .iter()
        .filter(|m| **m)
        .count();
    matching as f64 / 3.0
}

fn number_agreement(a: f64, b: f64, tolerance: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return 1.0;
    }
    let diff = (a - b).abs() / scale;
    if diff <= tolerance {
        1.0
    } else {
        (1.0 - diff).clamp(0.0, 1.0)
    }
}

fn jaccard(a: &str, b: &str) -> f64 {
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_agreement() {
        assert_eq!(agreement(AnswerType::Boolean, "YES", "YES", 0.0), 1.0);
        assert_eq!(agreement(AnswerType::Boolean, "YES", "NO", 0.0), 0.0);
        assert_eq!(agreement(AnswerType::Boolean, "UNKNOWN", "YES", 0.0), 0.0);
        assert_eq!(agreement(AnswerType::Boolean, "UNKNOWN", "UNKNOWN", 0.0), 1.0);
    }

    #[test]
    fn test_date_fields_compared_independently() {
        assert_eq!(agreement(AnswerType::Date, "01-15-24", "01-15-24", 0.0), 1.0);
        let one_off = agreement(AnswerType::Date, "01-15-24", "01-16-24", 0.0);
        assert!((one_off - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(agreement(AnswerType::Date, "01-15-24", "02-16-25", 0.0), 0.0);
    }

    #[test]
    fn test_number_agreement_with_tolerance() {
        assert_eq!(agreement(AnswerType::Number, "1000", "1005", 0.01), 1.0);
        let far = agreement(AnswerType::Number, "1000", "1500", 0.01);
        assert!((far - (1.0 - 500.0 / 1500.0)).abs() < 1e-9);
        assert_eq!(agreement(AnswerType::Number, "0", "0", 0.01), 1.0);
        assert_eq!(agreement(AnswerType::Number, "-5", "5", 0.01), 0.0);
    }

    #[test]
    fn test_text_jaccard() {
        assert_eq!(agreement(AnswerType::Text, "acme insurance", "acme insurance", 0.0), 1.0);
        let partial = agreement(AnswerType::Text, "acme insurance co", "acme insurance", 0.0);
        assert!((partial - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(agreement(AnswerType::Text, "alpha", "beta", 0.0), 0.0);
    }

    #[test]
    fn test_mean_pairwise() {
        let all_same = mean_pairwise_agreement(AnswerType::Boolean, &["YES", "YES", "YES"], 0.0);
        assert_eq!(all_same, 1.0);
        let one_dissent = mean_pairwise_agreement(AnswerType::Boolean, &["YES", "YES", "NO"], 0.0);
        assert!((one_dissent - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(mean_pairwise_agreement(AnswerType::Text, &["x"], 0.0), 1.0);
    }

    #[test]
    fn test_most_agreed() {
        assert_eq!(most_agreed(AnswerType::Boolean, &["NO", "YES", "YES"], 0.0), 1);
        assert_eq!(most_agreed(AnswerType::Number, &["100", "100", "250"], 0.02), 0);
    }
}
