//! Configuration types for recipe transcription and website synthesis.
//!
//! All behaviour is controlled through [`ScribeConfig`], built via its
//! [`ScribeConfigBuilder`]. The builder clamps numeric knobs into their
//! valid ranges and `build()` rejects anything that still doesn't make sense.

use crate::backend::ChatBackend;
use crate::error::ScribeError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Site name used when the caller does not supply one.
pub const DEFAULT_SITE_NAME: &str = "Family Recipe Collection";

/// Configuration for a transcription batch and the optional website step.
///
/// # Example
/// ```rust
/// use recipe_scribe::ScribeConfig;
///
/// let config = ScribeConfig::builder()
///     .concurrency(4)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScribeConfig {
    /// Maximum concurrent transcription calls. Default: 8.
    ///
    /// The effective pool is `min(image count, concurrency)`. Lower this if
    /// the provider answers with `429`.
    pub concurrency: usize,

    /// Model for transcription, e.g. "gpt-4o-mini". If None, uses the
    /// environment or [`crate::backend::DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Model for website synthesis. If None, the transcription backend is
    /// reused. Ignored when `backend` is set without a `synthesis_backend`.
    pub synthesis_model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed transcription backend. Takes precedence over
    /// `provider_name` and `model`.
    pub backend: Option<Arc<dyn ChatBackend>>,

    /// Pre-constructed synthesis backend. Takes precedence over
    /// `synthesis_model`.
    pub synthesis_backend: Option<Arc<dyn ChatBackend>>,

    /// Sampling temperature for transcription. Default: 0.1.
    pub temperature: f32,

    /// Sampling temperature for synthesis. Default: 0.7.
    pub synthesis_temperature: f32,

    /// Output budget per transcription. Default: 1500.
    pub max_tokens: usize,

    /// Output budget for the website. Default: 16000.
    ///
    /// A full page of embedded CSS plus a dozen recipes runs to several
    /// thousand tokens; too small a budget truncates the closing tags.
    pub synthesis_max_tokens: usize,

    /// Per-call timeout in seconds, applied to every model call. Default: 60.
    pub api_timeout_secs: u64,

    /// Timeout in seconds for the (single) synthesis call. Default: 300.
    pub synthesis_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom transcription instruction. If None, uses the built-in prompt.
    pub transcription_prompt: Option<String>,

    /// Strip an outer ```` ```markdown ```` fence and normalise line endings
    /// before trimming a transcription. Default: false.
    pub clean_markdown: bool,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            model: None,
            synthesis_model: None,
            provider_name: None,
            backend: None,
            synthesis_backend: None,
            temperature: 0.1,
            synthesis_temperature: 0.7,
            max_tokens: 1500,
            synthesis_max_tokens: 16_000,
            api_timeout_secs: 60,
            synthesis_timeout_secs: 300,
            download_timeout_secs: 120,
            transcription_prompt: None,
            clean_markdown: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScribeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScribeConfig")
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("synthesis_model", &self.synthesis_model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ChatBackend>"))
            .field(
                "synthesis_backend",
                &self.synthesis_backend.as_ref().map(|_| "<dyn ChatBackend>"),
            )
            .field("temperature", &self.temperature)
            .field("synthesis_temperature", &self.synthesis_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("synthesis_max_tokens", &self.synthesis_max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("synthesis_timeout_secs", &self.synthesis_timeout_secs)
            .field("clean_markdown", &self.clean_markdown)
            .finish()
    }
}

impl ScribeConfig {
    /// Create a new builder for `ScribeConfig`.
    pub fn builder() -> ScribeConfigBuilder {
        ScribeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScribeConfig`].
pub struct ScribeConfigBuilder {
    config: ScribeConfig,
}

impl fmt::Debug for ScribeConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScribeConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ScribeConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.config.synthesis_model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn synthesis_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.config.synthesis_backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn synthesis_temperature(mut self, t: f32) -> Self {
        self.config.synthesis_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn synthesis_max_tokens(mut self, n: usize) -> Self {
        self.config.synthesis_max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn synthesis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.synthesis_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn transcription_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.transcription_prompt = Some(prompt.into());
        self
    }

    pub fn clean_markdown(mut self, v: bool) -> Self {
        self.config.clean_markdown = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScribeConfig, ScribeError> {
        let c = &self.config;
        if c.max_tokens == 0 || c.synthesis_max_tokens == 0 {
            return Err(ScribeError::InvalidConfig(
                "Token budgets must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 || c.synthesis_timeout_secs == 0 || c.download_timeout_secs == 0 {
            return Err(ScribeError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref p) = c.transcription_prompt {
            if p.trim().is_empty() {
                return Err(ScribeError::InvalidConfig(
                    "Transcription prompt must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
