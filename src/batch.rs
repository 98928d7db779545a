//! Eager (whole-batch) transcription entry points.
//!
//! [`BatchTranscriber`] fans one [`TranscriptionClient`] call per image out
//! over a bounded pool and waits for all of them. Use
//! [`crate::stream::transcribe_stream`] instead to consume results as they
//! complete.
//!
//! Failure of one image never aborts the others: every submitted image yields
//! exactly one [`TranscriptionResult`], failed ones tagged with their error.
//! Each image runs on its own tokio task, so a panicking provider only fails
//! the image it was called for.

use crate::backend::{resolve_backend, resolve_synthesis_backend, ChatBackend};
use crate::config::ScribeConfig;
use crate::error::{ImageError, ScribeError};
use crate::output::{
    BatchOutput, BatchStats, Recipe, TranscriptionResult, TranscriptionStatus, UploadedImage,
    WebsiteDocument,
};
use crate::pipeline::extract::recipes_from_results;
use crate::pipeline::input;
use crate::pipeline::synthesize::WebsiteSynthesizer;
use crate::pipeline::transcribe::TranscriptionClient;
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Transcribes a batch of images with bounded concurrency.
#[derive(Clone)]
pub struct BatchTranscriber {
    client: TranscriptionClient,
    concurrency: usize,
    progress: Option<ProgressCallback>,
}

impl BatchTranscriber {
    pub fn new(backend: Arc<dyn ChatBackend>, config: &ScribeConfig) -> Self {
        Self {
            client: TranscriptionClient::new(backend, config),
            concurrency: config.concurrency.max(1),
            progress: config.progress_callback.clone(),
        }
    }

    /// Number of calls kept in flight for a batch of `image_count`.
    pub fn pool_size(&self, image_count: usize) -> usize {
        self.concurrency.min(image_count).max(1)
    }

    /// Transcribe every image, returning one result per image in completion
    /// order.
    ///
    /// At most `min(images.len(), concurrency)` calls are in flight. Clashing
    /// names are de-duplicated first so that `source_name` identifies each
    /// result uniquely.
    pub async fn transcribe_all(&self, images: Vec<UploadedImage>) -> Vec<TranscriptionResult> {
        let total = images.len();
        if let Some(ref cb) = self.progress {
            cb.on_batch_start(total);
        }
        if total == 0 {
            if let Some(ref cb) = self.progress {
                cb.on_batch_complete(0, 0);
            }
            return Vec::new();
        }

        let images = input::dedupe_names(images);
        let pool = self.pool_size(total);
        debug!("Transcribing {} images, {} in flight", total, pool);

        let results: Vec<TranscriptionResult> =
            stream::iter(images.into_iter().enumerate().map(|(index, image)| {
                let this = self.clone();
                async move { this.transcribe_isolated(index, image).await }
            }))
            .buffer_unordered(pool)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        info!("Batch complete: {}/{} images transcribed", succeeded, total);
        if let Some(ref cb) = self.progress {
            cb.on_batch_complete(total, succeeded);
        }
        results
    }

    /// Transcribe every image and assemble a [`BatchOutput`].
    ///
    /// Results are sorted by submission index and recipes are extracted from
    /// the successful ones.
    pub async fn transcribe_batch(&self, images: Vec<UploadedImage>) -> BatchOutput {
        let start = Instant::now();
        let mut results = self.transcribe_all(images).await;
        results.sort_by_key(|r| r.index);
        let recipes = recipes_from_results(&results);
        let stats = compute_stats(&results, start.elapsed().as_millis() as u64);
        BatchOutput {
            results,
            recipes,
            stats,
        }
    }

    /// Run [`Self::transcribe_one`] on its own task and turn a panic or
    /// cancellation into a failed result for that image.
    pub(crate) async fn transcribe_isolated(
        &self,
        index: usize,
        image: UploadedImage,
    ) -> TranscriptionResult {
        let name = image.name.clone();
        let start = Instant::now();
        let this = self.clone();

        match tokio::spawn(async move { this.transcribe_one(index, image).await }).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Transcription task for {} aborted: {}", name, e);
                let error = ImageError::Transport {
                    name,
                    detail: format!("task aborted: {e}"),
                };
                if let Some(ref cb) = self.progress {
                    cb.on_image_error(error.image_name(), &error.to_string());
                }
                TranscriptionResult::failed(index, error, start.elapsed().as_millis() as u64)
            }
        }
    }

    pub(crate) async fn transcribe_one(
        &self,
        index: usize,
        image: UploadedImage,
    ) -> TranscriptionResult {
        let start = Instant::now();
        if let Some(ref cb) = self.progress {
            cb.on_image_start(&image.name);
        }

        let outcome = self.client.transcribe_detailed(&image.bytes, &image.name).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(t) => TranscriptionResult {
                index,
                source_name: image.name,
                text: t.text,
                status: TranscriptionStatus::Ok,
                error: None,
                input_tokens: t.input_tokens,
                output_tokens: t.output_tokens,
                duration_ms,
            },
            Err(e) => TranscriptionResult::failed(index, e, duration_ms),
        };

        if let Some(ref cb) = self.progress {
            match &result.error {
                None => cb.on_image_complete(&result.source_name, result.text.len()),
                Some(e) => cb.on_image_error(&result.source_name, &e.to_string()),
            }
        }
        result
    }
}

fn compute_stats(results: &[TranscriptionResult], duration_ms: u64) -> BatchStats {
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    BatchStats {
        total_images: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        total_input_tokens: results.iter().map(|r| r.input_tokens as u64).sum(),
        total_output_tokens: results.iter().map(|r| r.output_tokens as u64).sum(),
        duration_ms,
    }
}

/// Resolve files, directories or URLs and transcribe every image found.
///
/// # Errors
/// Returns `Err(ScribeError)` only for fatal errors:
/// - an input is missing, unreadable or not an image
/// - no images were found
/// - no provider could be configured
///
/// Failed images, even all of them, are reported per image in
/// `output.results`; call [`BatchOutput::into_result`] to treat them as an
/// error.
pub async fn transcribe_inputs(
    inputs: &[impl AsRef<str>],
    config: &ScribeConfig,
) -> Result<BatchOutput, ScribeError> {
    let inputs: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
    info!("Starting batch: {} inputs", inputs.len());

    let images = input::resolve_inputs(&inputs, config.download_timeout_secs).await?;
    let backend = resolve_backend(config)?;
    let output = BatchTranscriber::new(backend, config)
        .transcribe_batch(images)
        .await;

    if output.stats.succeeded == 0 {
        warn!("All {} images failed to transcribe", output.stats.total_images);
    }

    info!(
        "Transcription complete: {}/{} images, {}ms",
        output.stats.succeeded, output.stats.total_images, output.stats.duration_ms
    );
    Ok(output)
}

/// Synchronous wrapper around [`transcribe_inputs`].
///
/// Creates a temporary tokio runtime internally.
pub fn transcribe_inputs_sync(
    inputs: &[impl AsRef<str>],
    config: &ScribeConfig,
) -> Result<BatchOutput, ScribeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScribeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(transcribe_inputs(inputs, config))
}

/// Synthesize a website from `recipes` using the configured synthesis
/// backend.
pub async fn synthesize_site(
    recipes: &[Recipe],
    site_name: &str,
    config: &ScribeConfig,
) -> Result<WebsiteDocument, ScribeError> {
    if recipes.is_empty() {
        return Err(ScribeError::NothingToSynthesize);
    }
    let backend = resolve_synthesis_backend(config)?;
    WebsiteSynthesizer::new(backend, config)
        .synthesize(recipes, site_name)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, ChatReply, ChatRequest};
    use async_trait::async_trait;

    /// Fails any image whose bytes start with `!`, panics on `panic`,
    /// otherwise echoes them.
    struct Picky;

    #[async_trait]
    impl ChatBackend for Picky {
        async fn complete(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
            let image = request.image.ok_or_else(|| BackendError::Transport("no image".into()))?;
            let bytes = crate::pipeline::encode::decode(&image.data)
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if text.starts_with('!') {
                return Err(BackendError::Transport("connection reset".into()));
            }
            if text.starts_with("panic") {
                panic!("provider bug on one image");
            }
            Ok(ChatReply {
                content: text,
                prompt_tokens: 10,
                completion_tokens: 5,
            })
        }
    }

    fn transcriber() -> BatchTranscriber {
        BatchTranscriber::new(Arc::new(Picky), &ScribeConfig::default())
    }

    #[tokio::test]
    async fn empty_batch_yields_no_results() {
        assert!(transcriber().transcribe_all(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn batch_output_is_sorted_and_counted() {
        let images = vec![
            UploadedImage::new("a.jpg", "# A\none"),
            UploadedImage::new("b.jpg", "!broken"),
            UploadedImage::new("c.jpg", "plain text"),
        ];
        let out = transcriber().transcribe_batch(images).await;

        let indices: Vec<usize> = out.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(out.stats.total_images, 3);
        assert_eq!(out.stats.succeeded, 2);
        assert_eq!(out.stats.failed, 1);
        assert_eq!(out.stats.total_input_tokens, 20);
        assert_eq!(out.stats.total_output_tokens, 10);

        assert_eq!(out.recipes.len(), 2);
        assert_eq!(out.recipes[0].title, "A");
        assert_eq!(out.recipes[1].title, "Untitled Recipe");

        let failed = &out.results[1];
        assert_eq!(failed.source_name, "b.jpg");
        assert!(failed.text.is_empty());
        assert_eq!(out.failures().count(), 1);
    }

    #[tokio::test]
    async fn panicking_call_fails_only_its_image() {
        let images = vec![
            UploadedImage::new("a.jpg", "# A\none"),
            UploadedImage::new("b.jpg", "panic"),
            UploadedImage::new("c.jpg", "# C\nthree"),
        ];
        let out = transcriber().transcribe_batch(images).await;

        assert_eq!(out.results.len(), 3);
        assert_eq!(out.stats.succeeded, 2);
        let failed = &out.results[1];
        assert_eq!(failed.index, 1);
        assert_eq!(failed.source_name, "b.jpg");
        match &failed.error {
            Some(ImageError::Transport { name, detail }) => {
                assert_eq!(name, "b.jpg");
                assert!(detail.contains("task aborted"), "detail: {detail}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(out.recipes[0].title, "A");
        assert_eq!(out.recipes[1].title, "C");
    }

    #[tokio::test]
    async fn duplicate_names_get_unique_results() {
        let images = vec![
            UploadedImage::new("card.jpg", "one"),
            UploadedImage::new("card.jpg", "two"),
        ];
        let out = transcriber().transcribe_batch(images).await;
        assert_eq!(out.results[0].source_name, "card.jpg");
        assert_eq!(out.results[1].source_name, "card (2).jpg");
        assert_eq!(out.results[1].text, "two");
    }

    #[tokio::test]
    async fn nothing_to_synthesize_short_circuits() {
        let err = synthesize_site(&[], "Site", &ScribeConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::NothingToSynthesize));
    }

    #[test]
    fn pool_size_is_bounded_by_batch() {
        let t = transcriber();
        assert_eq!(t.pool_size(3), 3);
        assert_eq!(t.pool_size(50), 8);
        assert_eq!(t.pool_size(0), 1);
    }

    #[test]
    fn stats_of_empty_results() {
        let stats = compute_stats(&[], 0);
        assert_eq!(stats.total_images, 0);
        assert_eq!(stats.failed, 0);
    }
}
