//! LLM backend contract.
//!
//! The generate and classify step kinds call into this trait with a fully
//! assembled prompt and the run's [`LlmConfig`]. Implementations live in
//! weft-infra; test code substitutes canned backends.

use async_trait::async_trait;

use weft_types::error::EngineError;
use weft_types::llm::LlmConfig;

/// Text-generation backend selected per call by `LlmConfig.provider`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate text for a prompt.
    ///
    /// Missing required credentials must surface as
    /// [`EngineError::LlmConfig`] (never retried); transport or provider
    /// failures as [`EngineError::Llm`] (retryable).
    async fn generate(&self, prompt: &str, config: &LlmConfig) -> Result<String, EngineError>;
}
