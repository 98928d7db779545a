//! Optional cleanup of a transcription before it is trimmed.
//!
//! Only applied when [`crate::config::ScribeConfig::clean_markdown`] is set.
//! Models occasionally ignore the "no code fences" instruction and wrap the
//! whole reply in ```` ```markdown ````, which would hide the heading from
//! the title extractor.

use once_cell::sync::Lazy;
use regex::Regex;

/// Strip outer fences, normalise line endings and trailing whitespace.
pub fn clean_transcription(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    trim_trailing_whitespace(&s)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
