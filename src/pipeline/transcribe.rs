//! Single-image transcription: one photo in, one markdown string out.
//!
//! [`TranscriptionClient`] never retries. Every failure mode (transport,
//! authentication, rate limit, timeout, empty reply) comes back as an
//! [`ImageError`] naming the image, so the batch layer can turn it into a
//! failed-but-present result.

use crate::backend::{BackendError, ChatBackend, ChatReply, ChatRequest};
use crate::config::ScribeConfig;
use crate::error::ImageError;
use crate::pipeline::{encode, postprocess};
use crate::prompts::TRANSCRIPTION_PROMPT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Text plus token accounting for one successful call.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Wraps one vision-model call per image.
#[derive(Clone)]
pub struct TranscriptionClient {
    backend: Arc<dyn ChatBackend>,
    prompt: String,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
    clean_markdown: bool,
}

impl TranscriptionClient {
    pub fn new(backend: Arc<dyn ChatBackend>, config: &ScribeConfig) -> Self {
        Self {
            backend,
            prompt: config
                .transcription_prompt
                .clone()
                .unwrap_or_else(|| TRANSCRIPTION_PROMPT.to_string()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.api_timeout_secs),
            clean_markdown: config.clean_markdown,
        }
    }

    /// Transcribe one image, returning only the text.
    pub async fn transcribe(&self, image_bytes: &[u8], name: &str) -> Result<String, ImageError> {
        self.transcribe_detailed(image_bytes, name)
            .await
            .map(|t| t.text)
    }

    /// Transcribe one image, keeping token counts.
    pub async fn transcribe_detailed(
        &self,
        image_bytes: &[u8],
        name: &str,
    ) -> Result<Transcription, ImageError> {
        let request = ChatRequest {
            system: None,
            prompt: self.prompt.clone(),
            image: Some(encode::encode_image(image_bytes)),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let reply = match tokio::time::timeout(self.timeout, self.backend.complete(request)).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!("{}: transcription failed — {}", name, e);
                return Err(image_error(name, e));
            }
            Err(_) => {
                warn!("{}: transcription timed out after {:?}", name, self.timeout);
                return Err(ImageError::Timeout {
                    name: name.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let text = self.finish_text(&reply);
        if text.is_empty() {
            return Err(ImageError::MalformedResponse {
                name: name.to_string(),
                detail: "model returned an empty reply".to_string(),
            });
        }

        debug!(
            "{}: {} chars, {} input tokens, {} output tokens",
            name,
            text.len(),
            reply.prompt_tokens,
            reply.completion_tokens
        );

        Ok(Transcription {
            text,
            input_tokens: reply.prompt_tokens,
            output_tokens: reply.completion_tokens,
        })
    }

    fn finish_text(&self, reply: &ChatReply) -> String {
        if self.clean_markdown {
            postprocess::clean_transcription(&reply.content)
                .trim()
                .to_string()
        } else {
            reply.content.trim().to_string()
        }
    }
}

fn image_error(name: &str, e: BackendError) -> ImageError {
    let name = name.to_string();
    match e {
        BackendError::Transport(detail) => ImageError::Transport { name, detail },
        BackendError::Auth(detail) => ImageError::Auth { name, detail },
        BackendError::RateLimited(detail) => ImageError::RateLimited { name, detail },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, BackendError>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn err(e: BackendError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(e),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for Canned {
        async fn complete(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map(|content| ChatReply {
                content,
                prompt_tokens: 7,
                completion_tokens: 3,
            })
        }
    }

    struct Stalled;

    #[async_trait]
    impl ChatBackend for Stalled {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatReply, BackendError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ChatReply::default())
        }
    }

    fn client(backend: Arc<dyn ChatBackend>, config: &ScribeConfig) -> TranscriptionClient {
        TranscriptionClient::new(backend, config)
    }

    #[tokio::test]
    async fn returns_trimmed_reply() {
        let backend = Canned::ok("\n  # Soup\n- water  \n\n");
        let c = client(backend.clone(), &ScribeConfig::default());
        let text = c.transcribe(b"bytes", "soup.jpg").await.unwrap();
        assert_eq!(text, "# Soup\n- water");
    }

    #[tokio::test]
    async fn request_carries_prompt_image_and_budget() {
        let backend = Canned::ok("# Soup");
        let c = client(backend.clone(), &ScribeConfig::default());
        c.transcribe(b"\x89PNG\r\n\x1a\n", "soup.png").await.unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let req = &seen[0];
        assert_eq!(req.prompt, TRANSCRIPTION_PROMPT);
        assert_eq!(req.max_tokens, 1500);
        let image = req.image.as_ref().expect("image attached");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(encode::decode(&image.data).unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn custom_prompt_is_used() {
        let backend = Canned::ok("ok");
        let config = ScribeConfig::builder()
            .transcription_prompt("Read this card.")
            .build()
            .unwrap();
        client(backend.clone(), &config)
            .transcribe(b"x", "card.jpg")
            .await
            .unwrap();
        assert_eq!(backend.seen.lock().unwrap()[0].prompt, "Read this card.");
    }

    #[tokio::test]
    async fn empty_reply_is_malformed() {
        let backend = Canned::ok("   \n ");
        let err = client(backend, &ScribeConfig::default())
            .transcribe(b"x", "blank.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::MalformedResponse { ref name, .. } if name == "blank.jpg"));
    }

    #[tokio::test]
    async fn backend_errors_keep_the_image_name() {
        let backend = Canned::err(BackendError::RateLimited("429".into()));
        let err = client(backend, &ScribeConfig::default())
            .transcribe(b"x", "busy.jpg")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ImageError::RateLimited {
                name: "busy.jpg".into(),
                detail: "429".into()
            }
        );
    }

    #[tokio::test]
    async fn stalled_call_times_out() {
        let config = ScribeConfig::builder().api_timeout_secs(1).build().unwrap();
        let err = client(Arc::new(Stalled), &config)
            .transcribe(b"x", "slow.jpg")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ImageError::Timeout {
                name: "slow.jpg".into(),
                secs: 1
            }
        );
    }

    #[tokio::test]
    async fn clean_markdown_strips_fences() {
        let backend = Canned::ok("```markdown\n# Stew\n- beef\n```");
        let config = ScribeConfig::builder().clean_markdown(true).build().unwrap();
        let text = client(backend, &config)
            .transcribe(b"x", "stew.jpg")
            .await
            .unwrap();
        assert_eq!(text, "# Stew\n- beef");
    }

    #[tokio::test]
    async fn detailed_keeps_token_counts() {
        let backend = Canned::ok("# Soup");
        let t = client(backend, &ScribeConfig::default())
            .transcribe_detailed(b"x", "soup.jpg")
            .await
            .unwrap();
        assert_eq!(t.input_tokens, 7);
        assert_eq!(t.output_tokens, 3);
    }
}
