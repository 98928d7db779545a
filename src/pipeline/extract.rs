//! Title/body split of a transcription.
//!
//! A best-effort heuristic over free-form model output: only the *first*
//! line is considered. If it is a markdown heading it becomes the title and
//! everything after it the content; otherwise the recipe is untitled and the
//! text is kept verbatim. Later headings are never promoted.

use crate::output::{Recipe, TranscriptionResult, UNTITLED_RECIPE};

/// Split a transcription into a [`Recipe`].
///
/// ```rust
/// use recipe_scribe::pipeline::extract::extract;
///
/// let r = extract("# Title\nline1\nline2");
/// assert_eq!(r.title, "Title");
/// assert_eq!(r.content, "line1\nline2");
/// ```
pub fn extract(text: &str) -> Recipe {
    let mut lines = text.lines();
    let first = lines.next().map(str::trim).unwrap_or("");

    if !first.starts_with('#') {
        return Recipe {
            title: UNTITLED_RECIPE.to_string(),
            content: text.to_string(),
        };
    }

    let title = heading_text(first);
    let title = if title.is_empty() {
        UNTITLED_RECIPE.to_string()
    } else {
        title.to_string()
    };

    Recipe {
        title,
        content: lines.collect::<Vec<_>>().join("\n"),
    }
}

/// Text of a heading line without its markers.
///
/// A trailing run of `#` is a closing sequence only when whitespace precedes
/// it, so `# Notes on C#` keeps its last character.
fn heading_text(line: &str) -> &str {
    let text = line.trim_start_matches('#').trim();
    let body = text.trim_end_matches('#');
    if body.is_empty() || body.ends_with(char::is_whitespace) {
        body.trim_end()
    } else {
        text
    }
}

/// Extract a recipe from every successful result, skipping failures.
///
/// Order follows the input slice.
pub fn recipes_from_results(results: &[TranscriptionResult]) -> Vec<Recipe> {
    results
        .iter()
        .filter(|r| r.is_ok())
        .map(|r| extract(&r.text))
        .collect()
}
