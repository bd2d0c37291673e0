//! Output format value object

use serde::{Deserialize, Serialize};

/// How a consensus decision is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Decision plus every candidate answer
    Full,
    /// Final answer, confidence and source (default)
    #[default]
    Summary,
    /// JSON output
    Json,
}
