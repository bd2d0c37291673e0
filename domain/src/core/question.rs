//! Question value object

use serde::{Deserialize, Serialize};

/// Words that never count as question keywords.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "which", "who", "whom", "when", "where",
    "why", "how", "this", "that", "these", "those", "with", "from", "into", "does", "did", "has",
    "have", "had", "any", "all", "not", "there", "their", "its", "his", "her", "you", "your",
    "our", "can", "will", "shall", "should", "would", "could", "may", "might", "must", "document",
    "is", "of", "on", "in", "to", "be", "by", "an", "or", "as", "at", "it", "if",
];

/// A question to be answered about a document (Value Object)
///
/// Represents the extraction query sent to every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a new question
    ///
    /// # Panics
    /// Panics if the content is empty or only whitespace
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        assert!(!content.trim().is_empty(), "Question cannot be empty");
        Self { content }
    }

    /// Try to create a new question, returning None if invalid
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }

    /// Significant words of the question, lower-cased and deduplicated.
    ///
    /// Words shorter than three characters and common stopwords are skipped.
    /// Order of first appearance is preserved.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for word in self
            .content
            .split(|c: char| !c.is_alphanumeric())
            .map(|w| w.to_lowercase())
        {
            if word.chars().count() < 3 || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            if !keywords.contains(&word) {
                keywords.push(word);
            }
        }
        keywords
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<&str> for Question {
    fn from(s: &str) -> Self {
        Question::new(s)
    }
}

impl From<String> for Question {
    fn from(s: String) -> Self {
        Question::new(s)
    }
}
