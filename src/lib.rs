//! # recipe-scribe
//!
//! Transcribe photos of handwritten recipes into markdown with a vision
//! language model, and optionally turn the collection into a single-file
//! recipe website.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photos
//!  │
//!  ├─ 1. Input       resolve files, directories or URLs
//!  ├─ 2. Encode      bytes → base64 + MIME type
//!  ├─ 3. Transcribe  concurrent vision-model calls, one per photo
//!  ├─ 4. Extract     first heading → recipe title
//!  ├─ 5. Export      CSV of (image name, transcription)
//!  └─ 6. Synthesize  one text-model call → standalone HTML website
//! ```
//!
//! A failed photo never aborts the batch: every photo yields exactly one
//! [`TranscriptionResult`], failed ones tagged with an [`ImageError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recipe_scribe::{synthesize_site, transcribe_inputs, ScribeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ScribeConfig::default();
//!     let output = transcribe_inputs(&["cards/"], &config).await?;
//!     for recipe in &output.recipes {
//!         println!("{}", recipe.title);
//!     }
//!     let site = synthesize_site(&output.recipes, "Grandma's Kitchen", &config).await?;
//!     std::fs::write("recipes.html", site.html)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `recipe-scribe` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! recipe-scribe = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendError, ChatBackend, ChatReply, ChatRequest, LlmBackend};
pub use batch::{synthesize_site, transcribe_inputs, transcribe_inputs_sync, BatchTranscriber};
pub use config::{ScribeConfig, ScribeConfigBuilder};
pub use error::{ImageError, ScribeError, ValidationWarning};
pub use export::{to_csv, write_csv, write_html, write_json};
pub use output::{
    BatchOutput, BatchStats, Recipe, TranscriptionResult, TranscriptionStatus, UploadedImage,
    WebsiteDocument,
};
pub use pipeline::extract::extract;
pub use pipeline::synthesize::WebsiteSynthesizer;
pub use pipeline::transcribe::TranscriptionClient;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{transcribe_images_stream, transcribe_stream, ResultStream};
