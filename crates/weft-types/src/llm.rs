//! LLM backend configuration.
//!
//! `LlmConfig` selects the provider endpoint and credentials used by the
//! generate/classify step kinds. API keys are wrapped in
//! [`secrecy::SecretString`] so they never appear in Debug output or logs.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Which backend endpoint family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    /// An OpenAI-compatible chat-completions endpoint.
    OpenaiCompatible,
    /// The Anthropic messages endpoint.
    Anthropic,
    /// A local inference server (Ollama-style generate endpoint).
    Local,
}

/// Per-run LLM configuration, copied (not shared) into child contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// Model override; each provider has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key. Required for hosted providers, unused for local. Accepted
    /// on deserialization but never written back out -- `SecretString` is
    /// deserialize-only, and a serialized config must not leak credentials.
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Endpoint base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl LlmConfig {
    /// Configuration for a local inference server, no credentials needed.
    pub fn local() -> Self {
        Self {
            provider: LlmProviderKind::Local,
            model: None,
            api_key: None,
            base_url: None,
        }
    }

    /// Replace the model selection, keeping everything else.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
