//! Model backend seam.
//!
//! The pipeline never talks to an LLM SDK directly. It goes through
//! [`ChatBackend`], a one-method async trait that takes a prompt (plus an
//! optional image) and returns the model's text. [`LlmBackend`] implements
//! it on top of any `edgequake-llm` provider; tests implement it with canned
//! replies.
//!
//! The backend is always constructed by the caller and passed in, either
//! directly to [`crate::batch::BatchTranscriber`] /
//! [`crate::pipeline::synthesize::WebsiteSynthesizer`] or through
//! [`crate::config::ScribeConfig::backend`].

use crate::config::ScribeConfig;
use crate::error::ScribeError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default model when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// One request to a chat-style model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub image: Option<EncodedImage>,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// The model's single reply.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Failure reaching a model endpoint.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    RateLimited(String),
}

impl BackendError {
    /// Classify a provider error message.
    ///
    /// Providers surface HTTP failures as text, so the status code is the
    /// only reliable signal.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("rate limit") || lower.contains("rate_limit") {
            BackendError::RateLimited(message)
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
            || lower.contains("incorrect api key")
        {
            BackendError::Auth(message)
        } else {
            BackendError::Transport(message)
        }
    }
}

/// A chat-completion endpoint, optionally vision-capable.
///
/// Implementations must be `Send + Sync`: one backend is shared by every
/// concurrent transcription task.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, BackendError>;
}

/// [`ChatBackend`] over an `edgequake-llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChatBackend for LlmBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage::system(system));
        }
        match request.image {
            Some(image) => {
                let data = ImageData::new(image.data, image.mime_type).with_detail("high");
                messages.push(ChatMessage::user_with_images(&request.prompt, vec![data]));
            }
            None => messages.push(ChatMessage::user(&request.prompt)),
        }

        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| BackendError::classify(e.to_string()))?;

        debug!(
            "LLM reply: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(ChatReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
        })
    }
}

/// Resolve the transcription backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`): used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present** (`OPENAI_API_KEY`): OpenAI with the configured
///    or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_backend(config: &ScribeConfig) -> Result<Arc<dyn ChatBackend>, ScribeError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    let model = config.model.as_deref();
    resolve_named(config.provider_name.as_deref(), model)
}

/// Resolve the synthesis backend.
///
/// Falls back to the transcription backend unless a dedicated synthesis
/// backend or model is configured.
pub fn resolve_synthesis_backend(
    config: &ScribeConfig,
) -> Result<Arc<dyn ChatBackend>, ScribeError> {
    if let Some(ref backend) = config.synthesis_backend {
        return Ok(Arc::clone(backend));
    }
    match config.synthesis_model.as_deref() {
        Some(model) if config.backend.is_none() => {
            resolve_named(config.provider_name.as_deref(), Some(model))
        }
        Some(model) => {
            debug!(
                "Ignoring synthesis model '{}': an injected backend is configured",
                model
            );
            resolve_backend(config)
        }
        None => resolve_backend(config),
    }
}

fn resolve_named(
    provider_name: Option<&str>,
    model: Option<&str>,
) -> Result<Arc<dyn ChatBackend>, ScribeError> {
    if let Some(name) = provider_name {
        return create_provider(name, model.unwrap_or(DEFAULT_MODEL));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, model.unwrap_or(&env_model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model.unwrap_or(DEFAULT_MODEL));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScribeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(LlmBackend::new(llm_provider)))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn ChatBackend>, ScribeError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScribeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    debug!("Using provider '{}' with model '{}'", provider_name, model);
    Ok(Arc::new(LlmBackend::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ChatBackend for Echo {
        async fn complete(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
            Ok(ChatReply {
                content: request.prompt,
                ..Default::default()
            })
        }
    }

    #[test]
    fn classify_rate_limit() {
        assert!(matches!(
            BackendError::classify("HTTP 429 Too Many Requests"),
            BackendError::RateLimited(_)
        ));
    }

    #[test]
    fn classify_auth() {
        assert!(matches!(
            BackendError::classify("status 401: Incorrect API key provided"),
            BackendError::Auth(_)
        ));
    }

    #[test]
    fn classify_other_as_transport() {
        assert!(matches!(
            BackendError::classify("connection reset by peer"),
            BackendError::Transport(_)
        ));
    }

    #[test]
    fn configured_backend_takes_priority() {
        let backend: Arc<dyn ChatBackend> = Arc::new(Echo);
        let config = ScribeConfig::builder()
            .backend(Arc::clone(&backend))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let resolved = resolve_backend(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &backend));
    }

    #[test]
    fn synthesis_falls_back_to_transcription_backend() {
        let backend: Arc<dyn ChatBackend> = Arc::new(Echo);
        let config = ScribeConfig::builder()
            .backend(Arc::clone(&backend))
            .build()
            .unwrap();
        let resolved = resolve_synthesis_backend(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &backend));
    }

    #[test]
    fn synthesis_model_is_ignored_with_injected_backend() {
        let backend: Arc<dyn ChatBackend> = Arc::new(Echo);
        let config = ScribeConfig::builder()
            .backend(Arc::clone(&backend))
            .synthesis_model("some-text-model")
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let resolved = resolve_synthesis_backend(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &backend));
    }

    #[tokio::test]
    async fn echo_backend_round_trip() {
        let reply = Echo
            .complete(ChatRequest {
                system: None,
                prompt: "hello".into(),
                image: None,
                max_tokens: 10,
                temperature: 0.0,
            })
            .await
            .unwrap();
        assert_eq!(reply.content, "hello");
    }
}
