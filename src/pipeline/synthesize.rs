//! Website synthesis: recipes → one self-contained HTML document.
//!
//! A single text-generation call, issued after the transcription batch has
//! finished. Failure here is terminal for the website only; the
//! transcriptions the caller already holds stay valid.
//!
//! ## Payload extraction
//!
//! Models are asked to answer with one ```` ```html ```` block but often add
//! a sentence before or after it. The interior of the *first* block tagged
//! `html` is the payload; a reply with no such block is taken whole. An
//! opening html fence that never closes is stripped and reported as
//! [`ValidationWarning::UnclosedFence`].

use crate::backend::{BackendError, ChatBackend, ChatRequest};
use crate::config::{ScribeConfig, DEFAULT_SITE_NAME};
use crate::error::{ScribeError, ValidationWarning};
use crate::output::{Recipe, WebsiteDocument};
use crate::progress::ProgressCallback;
use crate::prompts::{website_prompt, WEBSITE_SYSTEM_PROMPT};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static RE_HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```[ \t]*html[ \t]*\r?\n(.*?)```").unwrap());

static RE_OPEN_HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```[ \t]*html[ \t]*\r?\n(.*)$").unwrap());

static RE_DOCTYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<!doctype\s+html").unwrap());

/// Return the HTML payload of a model reply.
pub fn extract_html(reply: &str) -> String {
    split_payload(reply).0
}

/// Payload plus whether its html fence was left open.
fn split_payload(reply: &str) -> (String, bool) {
    if let Some(caps) = RE_HTML_FENCE.captures(reply) {
        return (caps[1].trim().to_string(), false);
    }
    match RE_OPEN_HTML_FENCE.captures(reply) {
        Some(caps) => (caps[1].trim().to_string(), true),
        None => (reply.trim().to_string(), false),
    }
}

/// Check a payload for problems that don't prevent rendering.
pub fn validate_html(html: &str) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    if !RE_DOCTYPE.is_match(html) {
        warnings.push(ValidationWarning::MissingDoctype);
    }
    warnings
}

/// Sends the recipe list to a text-generation model and returns its website.
#[derive(Clone)]
pub struct WebsiteSynthesizer {
    backend: Arc<dyn ChatBackend>,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
    progress: Option<ProgressCallback>,
}

impl WebsiteSynthesizer {
    pub fn new(backend: Arc<dyn ChatBackend>, config: &ScribeConfig) -> Self {
        Self {
            backend,
            max_tokens: config.synthesis_max_tokens,
            temperature: config.synthesis_temperature,
            timeout: Duration::from_secs(config.synthesis_timeout_secs),
            progress: config.progress_callback.clone(),
        }
    }

    /// Build the website for `recipes`.
    ///
    /// A blank `site_name` falls back to [`DEFAULT_SITE_NAME`].
    pub async fn synthesize(
        &self,
        recipes: &[Recipe],
        site_name: &str,
    ) -> Result<WebsiteDocument, ScribeError> {
        if recipes.is_empty() {
            return Err(ScribeError::NothingToSynthesize);
        }
        let site_name = match site_name.trim() {
            "" => DEFAULT_SITE_NAME,
            s => s,
        };

        if let Some(ref cb) = self.progress {
            cb.on_synthesis_start(recipes.len());
        }
        let result = self.run(recipes, site_name).await;
        if let Some(ref cb) = self.progress {
            cb.on_synthesis_complete(result.is_ok());
        }
        result
    }

    async fn run(&self, recipes: &[Recipe], site_name: &str) -> Result<WebsiteDocument, ScribeError> {
        let start = Instant::now();
        info!("Synthesizing website '{}' from {} recipes", site_name, recipes.len());

        let prompt = website_prompt(recipes, site_name)
            .map_err(|e| ScribeError::Internal(format!("Failed to encode recipes: {e}")))?;

        let request = ChatRequest {
            system: Some(WEBSITE_SYSTEM_PROMPT.to_string()),
            prompt,
            image: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let reply = tokio::time::timeout(self.timeout, self.backend.complete(request))
            .await
            .map_err(|_| ScribeError::SynthesisFailed {
                detail: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| ScribeError::SynthesisFailed {
                detail: match e {
                    BackendError::Auth(m) => format!("authentication error: {m}"),
                    BackendError::RateLimited(m) => format!("rate limit exceeded: {m}"),
                    BackendError::Transport(m) => m,
                },
            })?;

        let (html, unclosed) = split_payload(&reply.content);
        if html.is_empty() {
            return Err(ScribeError::MalformedResponse {
                detail: "model returned an empty website".to_string(),
            });
        }

        let mut warnings = validate_html(&html);
        if unclosed {
            warnings.push(ValidationWarning::UnclosedFence);
        }
        for w in &warnings {
            warn!("{}", w);
        }
        debug!(
            "Website: {} bytes, {} output tokens, {:?}",
            html.len(),
            reply.completion_tokens,
            start.elapsed()
        );

        Ok(WebsiteDocument { html, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_interior_only() {
        let reply = "Here you go!\n```html\n<!DOCTYPE html>\n<html></html>\n```\nEnjoy.";
        assert_eq!(extract_html(reply), "<!DOCTYPE html>\n<html></html>");
    }

    #[test]
    fn uppercase_tag_is_accepted() {
        let reply = "```HTML\n<p>x</p>\n```";
        assert_eq!(extract_html(reply), "<p>x</p>");
    }

    #[test]
    fn first_block_wins() {
        let reply = "```html\n<p>one</p>\n```\ntext\n```html\n<p>two</p>\n```";
        assert_eq!(extract_html(reply), "<p>one</p>");
    }

    #[test]
    fn untagged_fence_is_not_a_payload_marker() {
        let reply = "```css\nbody{}\n```";
        assert_eq!(extract_html(reply), reply);
    }

    #[test]
    fn no_fence_returns_trimmed_reply() {
        let reply = "\n  <!DOCTYPE html><html></html>  \n";
        assert_eq!(extract_html(reply), "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn unclosed_fence_is_stripped() {
        let reply = "Sure:\n```html\n<!DOCTYPE html>\n<html><body>cut";
        assert_eq!(
            split_payload(reply),
            ("<!DOCTYPE html>\n<html><body>cut".to_string(), true)
        );
        assert_eq!(extract_html(reply), "<!DOCTYPE html>\n<html><body>cut");
        assert!(!split_payload("```html\n<p>x</p>\n```").1);
    }

    struct Truncated;

    #[async_trait::async_trait]
    impl ChatBackend for Truncated {
        async fn complete(
            &self,
            _request: ChatRequest,
        ) -> Result<crate::backend::ChatReply, BackendError> {
            Ok(crate::backend::ChatReply {
                content: "```html\n<!DOCTYPE html>\n<html><body><h1>Pie".into(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn truncated_reply_is_flagged() {
        let s = WebsiteSynthesizer::new(Arc::new(Truncated), &ScribeConfig::default());
        let recipe = Recipe {
            title: "Pie".into(),
            content: "apples".into(),
        };
        let site = tokio_test::block_on(s.synthesize(&[recipe], "Site")).unwrap();
        assert!(!site.html.starts_with("```"));
        assert_eq!(site.warnings, vec![ValidationWarning::UnclosedFence]);
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl ChatBackend for Unreachable {
        async fn complete(
            &self,
            _request: ChatRequest,
        ) -> Result<crate::backend::ChatReply, BackendError> {
            panic!("no call expected for an empty recipe list");
        }
    }

    #[test]
    fn empty_recipe_list_is_rejected_without_a_call() {
        let s = WebsiteSynthesizer::new(Arc::new(Unreachable), &ScribeConfig::default());
        let err = tokio_test::block_on(s.synthesize(&[], "Site")).unwrap_err();
        assert!(matches!(err, ScribeError::NothingToSynthesize));
    }

    #[test]
    fn doctype_check_is_case_insensitive() {
        assert!(validate_html("<!doctype html><html></html>").is_empty());
        assert!(validate_html("<!DOCTYPE  HTML>").is_empty());
        assert_eq!(
            validate_html("<html></html>"),
            vec![ValidationWarning::MissingDoctype]
        );
    }
}
