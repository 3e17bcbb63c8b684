//! HTTP [`LlmBackend`] dispatching on the configured provider.
//!
//! One backend serves all three provider families: OpenAI-compatible chat
//! completions, the Anthropic Messages API, and a local Ollama-style
//! generate endpoint. API keys arrive wrapped in [`secrecy::SecretString`]
//! and are only exposed while building request headers -- they never appear
//! in Debug output or logs.
//!
//! Error mapping is part of the contract: a missing required credential is
//! `EngineError::LlmConfig` (never retried), while network faults, non-2xx
//! statuses, and malformed bodies are `EngineError::Llm` (retryable).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use weft_core::llm::LlmBackend;
use weft_types::error::EngineError;
use weft_types::llm::{LlmConfig, LlmProviderKind};

/// Anthropic Messages API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_ANTHROPIC_BASE: &str = "https://api.anthropic.com";
const DEFAULT_LOCAL_BASE: &str = "http://localhost:11434";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_LOCAL_MODEL: &str = "llama3.1";

/// Output cap for single-shot workflow generations.
const MAX_TOKENS: u32 = 1024;

/// Provider-dispatching HTTP LLM backend.
pub struct HttpLlmBackend {
    client: reqwest::Client,
}

impl HttpLlmBackend {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // long generations
            .build()
            .expect("failed to create reqwest client");
        Self { client }
    }

    async fn generate_openai(
        &self,
        prompt: &str,
        config: &LlmConfig,
    ) -> Result<String, EngineError> {
        let api_key = config.api_key.as_ref().ok_or_else(|| {
            EngineError::LlmConfig("OpenAI-compatible provider requires an API key".to_string())
        })?;
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_BASE);
        let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);

        let request = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{base}/chat/completions"))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Llm(format!("request failed: {e}")))?;
        let body: ChatCompletionResponse = check_status(response).await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::Llm("response contained no choices".to_string()))
    }

    async fn generate_anthropic(
        &self,
        prompt: &str,
        config: &LlmConfig,
    ) -> Result<String, EngineError> {
        let api_key = config.api_key.as_ref().ok_or_else(|| {
            EngineError::LlmConfig("Anthropic provider requires an API key".to_string())
        })?;
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_ANTHROPIC_BASE);
        let model = config.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);

        let request = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{base}/v1/messages"))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Llm(format!("request failed: {e}")))?;
        let body: MessagesResponse = check_status(response).await?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        if text.is_empty() {
            return Err(EngineError::Llm(
                "response contained no text blocks".to_string(),
            ));
        }
        Ok(text)
    }

    async fn generate_local(
        &self,
        prompt: &str,
        config: &LlmConfig,
    ) -> Result<String, EngineError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_LOCAL_BASE);
        let model = config.model.as_deref().unwrap_or(DEFAULT_LOCAL_MODEL);

        let request = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{base}/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Llm(format!("request failed: {e}")))?;
        let body: OllamaGenerateResponse = check_status(response).await?;
        Ok(body.response)
    }
}

impl Default for HttpLlmBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for HttpLlmBackend {
    async fn generate(&self, prompt: &str, config: &LlmConfig) -> Result<String, EngineError> {
        tracing::debug!(provider = ?config.provider, "dispatching LLM generation");
        match config.provider {
            LlmProviderKind::OpenaiCompatible => self.generate_openai(prompt, config).await,
            LlmProviderKind::Anthropic => self.generate_anthropic(prompt, config).await,
            LlmProviderKind::Local => self.generate_local(prompt, config).await,
        }
    }
}

/// Reject non-2xx responses with the status and body, then deserialize.
async fn check_status<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, EngineError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Llm(format!(
            "HTTP {status}: {}",
            body.chars().take(200).collect::<String>()
        )));
    }
    response
        .json()
        .await
        .map_err(|e| EngineError::Llm(format!("malformed response body: {e}")))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
