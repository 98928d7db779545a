//! Pipeline stages for recipe-photo transcription.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ transcribe ──▶ [postprocess] ──▶ extract ──▶ synthesize
//! (path/URL) (base64)   (vision LLM)    (optional)       (title)     (text LLM)
//! ```
//!
//! 1. [`input`]: resolve files, directories and URLs into named images
//! 2. [`encode`]: base64-wrap image bytes and sniff their MIME type
//! 3. [`transcribe`]: one vision-model call per image; the only stage that
//!    talks to the model per image
//! 4. [`postprocess`]: strip an outer markdown fence when enabled
//! 5. [`extract`]: split a transcription into title and body
//! 6. [`synthesize`]: one text-model call turning all recipes into a website

pub mod encode;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod synthesize;
pub mod transcribe;
