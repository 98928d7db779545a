//! Value types flowing through the pipeline.
//!
//! Every type here is created once and never mutated afterwards; each stage
//! produces new values from the previous stage's output.

use crate::error::{ImageError, ScribeError, ValidationWarning};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when a transcription does not start with a markdown heading.
pub const UNTITLED_RECIPE: &str = "Untitled Recipe";

/// One uploaded photo: a name unique within its batch plus the raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Outcome of a single transcription call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptionStatus {
    Ok,
    Failed,
}

/// The result of transcribing one [`UploadedImage`].
///
/// Exactly one is produced per submitted image. Results are collected in
/// completion order; `source_name` (or `index`, the submission position)
/// re-associates a result with its image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// 0-indexed position of the image in the submitted batch.
    pub index: usize,
    pub source_name: String,
    /// Trimmed markdown. Empty when `status` is `Failed`.
    pub text: String,
    pub status: TranscriptionStatus,
    pub error: Option<ImageError>,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

impl TranscriptionResult {
    pub fn is_ok(&self) -> bool {
        self.status == TranscriptionStatus::Ok
    }

    pub(crate) fn failed(index: usize, error: ImageError, duration_ms: u64) -> Self {
        Self {
            index,
            source_name: error.image_name().to_string(),
            text: String::new(),
            status: TranscriptionStatus::Failed,
            error: Some(error),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms,
        }
    }
}

/// A transcription split into a title and a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub content: String,
}

/// A synthesized single-file recipe website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteDocument {
    pub html: String,
    /// Non-fatal findings; the document is usable regardless.
    pub warnings: Vec<ValidationWarning>,
}

/// Aggregate numbers for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_images: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub duration_ms: u64,
}

/// Everything an eager batch run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One entry per submitted image, sorted by `index`.
    pub results: Vec<TranscriptionResult>,
    /// Recipes extracted from the successful results, in `index` order.
    pub recipes: Vec<Recipe>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Treat any failed image as an error.
    ///
    /// Returns [`ScribeError::AllImagesFailed`] when nothing succeeded and
    /// [`ScribeError::PartialFailure`] when only some images failed.
    pub fn into_result(self) -> Result<Self, ScribeError> {
        if self.stats.total_images > 0 && self.stats.succeeded == 0 {
            return Err(ScribeError::AllImagesFailed {
                total: self.stats.total_images,
                errors: self.results.into_iter().filter_map(|r| r.error).collect(),
            });
        }
        if self.stats.failed > 0 {
            return Err(ScribeError::PartialFailure {
                success: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_images,
            });
        }
        Ok(self)
    }

    /// Iterate over the failed results only.
    pub fn failures(&self) -> impl Iterator<Item = &TranscriptionResult> {
        self.results.iter().filter(|r| !r.is_ok())
    }
}
