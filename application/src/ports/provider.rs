//! Provider port
//!
//! Defines the single capability the core consumes: answering a prompt with
//! a model. Vendor wire formats live entirely behind implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified provider failure.
///
/// Only transient errors are retried by the admission controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Rate limiting, server errors, timeouts, connection resets
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Anything retrying cannot fix (bad request, auth, malformed reply)
    #[error("Fatal provider error: {0}")]
    Fatal(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// Classify an HTTP-style status code: 429 and 5xx are transient.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = format!("status {}: {}", code, message.into());
        if code == 429 || (500..600).contains(&code) {
            ProviderError::Transient(message)
        } else {
            ProviderError::Fatal(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderError::Transient(m) | ProviderError::Fatal(m) => m,
        }
    }
}

/// One model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            prompt: prompt.into(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Model output with token usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    pub text: String,
    pub tokens_used: u64,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            text: text.into(),
            tokens_used,
        }
    }
}

/// A model provider
///
/// Implementations (adapters) live in the infrastructure layer and must
/// enforce their own per-call timeout.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Identifier used in logs and decisions
    fn id(&self) -> &str;

    /// Send one request
    async fn call(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError>;
}
