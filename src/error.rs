//! Error types for the recipe-scribe library.
//!
//! Three distinct types reflect three distinct severities:
//!
//! * [`ScribeError`]: **Fatal**: the requested operation cannot proceed at
//!   all (no readable inputs, provider not configured, the synthesis call
//!   failed). Returned as `Err(ScribeError)` from the top-level functions.
//!
//! * [`ImageError`]: **Non-fatal**: a single image failed to transcribe
//!   (transport error, rate limit, empty reply) while every other image in
//!   the batch is unaffected. Stored inside
//!   [`crate::output::TranscriptionResult`] so the batch always yields one
//!   result per submitted image.
//!
//! * [`ValidationWarning`]: **Advisory**: the synthesized website looks
//!   suspicious but is still returned to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the recipe-scribe library.
///
/// Per-image failures use [`ImageError`] and are stored in
/// [`crate::output::TranscriptionResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ScribeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a supported image file, directory or URL.
    #[error("Unsupported input '{input}': expected a png/jpg/jpeg/webp/gif file, a directory, or an HTTP/HTTPS URL")]
    UnsupportedInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Nothing to transcribe: no inputs, or only empty directories.
    #[error("No images to transcribe")]
    EmptyBatch,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every image in the batch failed.
    ///
    /// Returned by [`crate::output::BatchOutput::into_result`]. Carries the
    /// error of every image, in submission order.
    #[error("All {total} images failed to transcribe.\nFirst error: {}", first_error(.errors))]
    AllImagesFailed {
        total: usize,
        errors: Vec<ImageError>,
    },

    /// Some images succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::BatchOutput::into_result`] when the
    /// caller wants to treat any image failure as an error.
    #[error("{failed}/{total} images failed during transcription")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// The website synthesis call could not reach the model.
    #[error("Website synthesis failed: {detail}")]
    SynthesisFailed { detail: String },

    /// The synthesis reply did not contain a usable payload.
    #[error("Malformed synthesis response: {detail}")]
    MalformedResponse { detail: String },

    /// Synthesis was requested for an empty recipe list.
    #[error("No recipes to build a website from")]
    NothingToSynthesize,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// Every variant names the image it belongs to so no failure is ever
/// detached from its source.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Network failure or a non-success status from the provider.
    #[error("{name}: transport error: {detail}")]
    Transport { name: String, detail: String },

    /// The provider rejected the credential (401/403).
    #[error("{name}: authentication error: {detail}")]
    Auth { name: String, detail: String },

    /// The provider returned HTTP 429.
    #[error("{name}: rate limit exceeded: {detail}")]
    RateLimited { name: String, detail: String },

    /// The call did not finish within the per-call budget.
    #[error("{name}: LLM call timed out after {secs}s")]
    Timeout { name: String, secs: u64 },

    /// The reply arrived but had no usable text.
    #[error("{name}: malformed response: {detail}")]
    MalformedResponse { name: String, detail: String },
}

impl ImageError {
    /// Name of the image this error belongs to.
    pub fn image_name(&self) -> &str {
        match self {
            ImageError::Transport { name, .. }
            | ImageError::Auth { name, .. }
            | ImageError::RateLimited { name, .. }
            | ImageError::Timeout { name, .. }
            | ImageError::MalformedResponse { name, .. } => name,
        }
    }
}

fn first_error(errors: &[ImageError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Advisory findings about a synthesized website.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ValidationWarning {
    /// The HTML payload has no `<!DOCTYPE html>` declaration.
    #[error("HTML payload has no <!DOCTYPE html> declaration; browsers will render it in quirks mode")]
    MissingDoctype,

    /// The reply opened an html block that never closed; it was most likely
    /// cut off by the output token limit.
    #[error("HTML block was never closed; the reply may have been truncated by the token limit")]
    UnclosedFence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = ScribeError::PartialFailure {
            success: 4,
            failed: 1,
            total: 5,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/5"), "got: {msg}");
    }

    #[test]
    fn image_error_names_its_image() {
        let e = ImageError::RateLimited {
            name: "grandma.jpg".into(),
            detail: "429".into(),
        };
        assert_eq!(e.image_name(), "grandma.jpg");
        assert!(e.to_string().starts_with("grandma.jpg:"));
    }

    #[test]
    fn timeout_display() {
        let e = ImageError::Timeout {
            name: "card.png".into(),
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
        assert!(e.to_string().contains("card.png"));
    }

    #[test]
    fn all_images_failed_display() {
        let e = ScribeError::AllImagesFailed {
            total: 2,
            errors: vec![
                ImageError::Transport {
                    name: "a.jpg".into(),
                    detail: "connection refused".into(),
                },
                ImageError::Timeout {
                    name: "b.jpg".into(),
                    secs: 60,
                },
            ],
        };
        assert!(e.to_string().contains("All 2 images"));
        assert!(e.to_string().contains("a.jpg: transport error: connection refused"));
        assert!(!e.to_string().contains("b.jpg"));

        let empty = ScribeError::AllImagesFailed {
            total: 0,
            errors: vec![],
        };
        assert!(empty.to_string().contains("unknown error"));
    }

    #[test]
    fn image_error_serialises() {
        let e = ImageError::MalformedResponse {
            name: "x.png".into(),
            detail: "empty reply".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ImageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
