//! Progress-callback trait for per-image transcription events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ScribeConfigBuilder::progress_callback`] to receive
//! events as the batch runs. Callers can forward them to a terminal progress
//! bar, a channel or a log without the library knowing how the host
//! application communicates.
//!
//! # Example
//!
//! ```rust
//! use recipe_scribe::{BatchProgressCallback, ScribeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, name: &str, text_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {name} ({text_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ScribeConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch transcriber and the synthesizer as work progresses.
///
/// Image events arrive concurrently from different tasks and in completion
/// order. Implementations must protect shared mutable state with the usual
/// primitives (`Mutex`, atomics). All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any image is dispatched.
    fn on_batch_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before the model request is sent for an image.
    fn on_image_start(&self, name: &str) {
        let _ = name;
    }

    /// Called when an image is transcribed successfully.
    ///
    /// `text_len` is the byte length of the transcription.
    fn on_image_complete(&self, name: &str, text_len: usize) {
        let _ = (name, text_len);
    }

    /// Called when an image fails; the batch continues.
    fn on_image_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after every image has produced a result.
    fn on_batch_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }

    /// Called before the website synthesis request is sent.
    fn on_synthesis_start(&self, recipe_count: usize) {
        let _ = recipe_count;
    }

    /// Called when the synthesis call has returned, successfully or not.
    fn on_synthesis_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScribeConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
