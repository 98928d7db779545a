//! Streaming transcription API: emit results as images complete.
//!
//! Unlike the eager [`crate::batch::transcribe_inputs`], which returns only
//! after every image finishes, [`transcribe_stream`] yields one
//! [`TranscriptionResult`] per image as soon as its call completes. Results
//! arrive in completion order; sort by `index` if submission order matters.
//!
//! Failed images are yielded as failed results, not as stream errors, so the
//! stream always produces exactly one item per image. Batch-level progress
//! events (`on_batch_start`, `on_batch_complete`) are not fired here.

use crate::backend::resolve_backend;
use crate::batch::BatchTranscriber;
use crate::config::ScribeConfig;
use crate::error::ScribeError;
use crate::output::{TranscriptionResult, UploadedImage};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of transcription results.
pub type ResultStream = Pin<Box<dyn Stream<Item = TranscriptionResult> + Send>>;

/// Resolve files, directories or URLs and stream their transcriptions.
///
/// # Returns
/// - `Ok(ResultStream)`: one item per resolved image
/// - `Err(ScribeError)`: fatal error (input not found, empty batch, provider
///   not configured)
pub async fn transcribe_stream(
    inputs: &[impl AsRef<str>],
    config: &ScribeConfig,
) -> Result<ResultStream, ScribeError> {
    let inputs: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
    info!("Starting streaming batch: {} inputs", inputs.len());

    let images = input::resolve_inputs(&inputs, config.download_timeout_secs).await?;
    let backend = resolve_backend(config)?;
    Ok(stream_images(BatchTranscriber::new(backend, config), images))
}

/// Stream transcriptions of images already held in memory.
///
/// Uses the configured backend; bounded by the configured concurrency.
pub fn transcribe_images_stream(
    images: Vec<UploadedImage>,
    config: &ScribeConfig,
) -> Result<ResultStream, ScribeError> {
    if images.is_empty() {
        return Err(ScribeError::EmptyBatch);
    }
    let backend = resolve_backend(config)?;
    Ok(stream_images(BatchTranscriber::new(backend, config), images))
}

fn stream_images(transcriber: BatchTranscriber, images: Vec<UploadedImage>) -> ResultStream {
    let images = input::dedupe_names(images);
    let pool = transcriber.pool_size(images.len());

    let s = stream::iter(images.into_iter().enumerate().map(move |(index, image)| {
        let t = transcriber.clone();
        async move { t.transcribe_isolated(index, image).await }
    }))
    .buffer_unordered(pool);

    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, ChatBackend, ChatReply, ChatRequest};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fixed;

    #[async_trait]
    impl ChatBackend for Fixed {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatReply, BackendError> {
            Ok(ChatReply {
                content: "# Bread\nflour".into(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn yields_one_item_per_image() {
        let config = ScribeConfig::builder()
            .backend(Arc::new(Fixed))
            .concurrency(2)
            .build()
            .unwrap();
        let images = (0..5)
            .map(|i| UploadedImage::new(format!("{i}.jpg"), vec![i as u8]))
            .collect();

        let mut results: Vec<TranscriptionResult> =
            transcribe_images_stream(images, &config).unwrap().collect().await;
        results.sort_by_key(|r| r.index);

        assert_eq!(results.len(), 5);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.index, i);
            assert_eq!(r.source_name, format!("{i}.jpg"));
            assert!(r.is_ok());
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let config = ScribeConfig::builder()
            .backend(Arc::new(Fixed))
            .build()
            .unwrap();
        assert!(matches!(
            transcribe_images_stream(Vec::new(), &config),
            Err(ScribeError::EmptyBatch)
        ));
    }
}
