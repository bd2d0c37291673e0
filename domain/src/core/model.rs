//! Model class value object

use serde::{Deserialize, Serialize};

/// Context-size class of a provider model (Value Object)
///
/// The chunking engine recommends one of these so callers can route a
/// document to an appropriately provisioned provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    /// Models with a modest input window
    SmallContext,
    /// Models that accept very long inputs
    LargeContext,
}

impl ModelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelClass::SmallContext => "small_context",
            ModelClass::LargeContext => "large_context",
        }
    }
}

impl std::fmt::Display for ModelClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
