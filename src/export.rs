//! Derived artifacts: CSV of transcriptions, HTML website, JSON dump.
//!
//! All writes are atomic (temp file in the target directory, then rename),
//! so an interrupted run never leaves a half-written file behind.

use crate::error::ScribeError;
use crate::output::{BatchOutput, TranscriptionResult, WebsiteDocument};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header record of the CSV export.
pub const CSV_HEADER: [&str; 2] = ["Image Name", "Transcribed Text"];

/// Render results as CSV: a header plus one record per result.
///
/// Fields are quoted per RFC 4180 when they contain a comma, a quote or a
/// line break. Failed results carry `[transcription failed: <error>]` in the
/// text column. Records end with `\n`.
pub fn to_csv(results: &[TranscriptionResult]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER[0], CSV_HEADER[1]);
    for r in results {
        match &r.error {
            None => push_record(&mut out, &r.source_name, &r.text),
            Some(e) => push_record(
                &mut out,
                &r.source_name,
                &format!("[transcription failed: {e}]"),
            ),
        }
    }
    out
}

fn push_record(out: &mut String, name: &str, text: &str) {
    out.push_str(&csv_field(name));
    out.push(',');
    out.push_str(&csv_field(text));
    out.push('\n');
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `contents` to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ScribeError> {
    let write_err = |e: std::io::Error| ScribeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Write the CSV export of `results` to `path`.
pub fn write_csv(path: &Path, results: &[TranscriptionResult]) -> Result<(), ScribeError> {
    write_atomic(path, to_csv(results).as_bytes())?;
    info!("Wrote {} CSV records to {}", results.len(), path.display());
    Ok(())
}

/// Write a synthesized website to `path`.
pub fn write_html(path: &Path, site: &WebsiteDocument) -> Result<(), ScribeError> {
    write_atomic(path, site.html.as_bytes())?;
    info!("Wrote website ({} bytes) to {}", site.html.len(), path.display());
    Ok(())
}

/// Write the full batch output as pretty-printed JSON.
pub fn write_json(path: &Path, output: &BatchOutput) -> Result<(), ScribeError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ScribeError::Internal(format!("Failed to serialise output: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    info!("Wrote JSON output to {}", path.display());
    Ok(())
}
