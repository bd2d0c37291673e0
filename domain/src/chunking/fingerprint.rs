//! Content fingerprints for chunk caching

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic SHA-256 fingerprint (hex encoded).
///
/// Derived from content only; two calls with the same input always yield
/// the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a document: its byte length followed by its content.
    pub fn of_document(document: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((document.len() as u64).to_le_bytes());
        hasher.update(document.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Cache key for chunking `document` for `question` under `budget_tokens`.
    pub fn of_request(document: &Fingerprint, question: &str, budget_tokens: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document.0.as_bytes());
        hasher.update([0u8]);
        hasher.update(question.as_bytes());
        hasher.update([0u8]);
        hasher.update((budget_tokens as u64).to_le_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(
            Fingerprint::of_document("policy text"),
            Fingerprint::of_document("policy text")
        );
    }

    #[test]
    fn test_content_sensitive() {
        assert_ne!(
            Fingerprint::of_document("policy text"),
            Fingerprint::of_document("policy texT")
        );
    }

    #[test]
    fn test_request_key_depends_on_all_inputs() {
        let doc = Fingerprint::of_document("policy text");
        let base = Fingerprint::of_request(&doc, "premium?", 1000);
        assert_eq!(base, Fingerprint::of_request(&doc, "premium?", 1000));
        assert_ne!(base, Fingerprint::of_request(&doc, "premium?", 2000));
        assert_ne!(base, Fingerprint::of_request(&doc, "deductible?", 1000));
    }

    #[test]
    fn test_hex_length() {
        let fp = Fingerprint::of_document("");
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(fp.short().len(), 12);
    }
}
