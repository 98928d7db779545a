//! Input resolution: turn user-supplied paths and URLs into a batch of
//! [`UploadedImage`]s.
//!
//! Accepted inputs:
//! - an image file (`png`, `jpg`, `jpeg`, `webp`, `gif`, by extension)
//! - a directory, whose image files are taken non-recursively in name order
//! - an HTTP/HTTPS URL, downloaded into memory
//!
//! Names must be unique within a batch because results are re-associated by
//! name. Clashing file names from different directories get ` (2)`, ` (3)`,
//! … appended before the extension.

use crate::error::ScribeError;
use crate::output::UploadedImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions accepted as recipe photos.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if a path has an accepted image extension (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resolve every input and assemble one batch with unique names.
pub async fn resolve_inputs(
    inputs: &[String],
    download_timeout_secs: u64,
) -> Result<Vec<UploadedImage>, ScribeError> {
    let mut images = Vec::new();
    for input in inputs {
        if is_url(input) {
            images.push(download_url(input, download_timeout_secs).await?);
        } else {
            for path in expand_local(input)? {
                images.push(read_local(&path).await?);
            }
        }
    }
    if images.is_empty() {
        return Err(ScribeError::EmptyBatch);
    }
    info!("Resolved {} images", images.len());
    Ok(dedupe_names(images))
}

/// Expand a local path into the image files it denotes.
fn expand_local(input: &str) -> Result<Vec<PathBuf>, ScribeError> {
    let path = PathBuf::from(input);
    if !path.exists() {
        return Err(ScribeError::FileNotFound { path });
    }

    if path.is_dir() {
        let entries = std::fs::read_dir(&path).map_err(|e| io_error(&path, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image_path(p))
            .collect();
        files.sort();
        debug!("{}: {} image files", path.display(), files.len());
        return Ok(files);
    }

    if !is_image_path(&path) {
        return Err(ScribeError::UnsupportedInput {
            input: input.to_string(),
        });
    }
    Ok(vec![path])
}

async fn read_local(path: &Path) -> Result<UploadedImage, ScribeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Read {} ({} bytes)", name, bytes.len());
    Ok(UploadedImage::new(name, bytes))
}

fn io_error(path: &Path, e: std::io::Error) -> ScribeError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScribeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => ScribeError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ScribeError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    }
}

/// Download an image URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedImage, ScribeError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScribeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScribeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ScribeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ScribeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ScribeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(UploadedImage::new(filename_from_url(url), bytes.to_vec()))
}

/// Last path segment of the URL, or a generic name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded-image".to_string()
}

/// Make every name in the batch unique, keeping the first occurrence as-is.
pub fn dedupe_names(images: Vec<UploadedImage>) -> Vec<UploadedImage> {
    let mut seen: HashSet<String> = HashSet::with_capacity(images.len());
    images
        .into_iter()
        .map(|mut img| {
            if seen.insert(img.name.clone()) {
                return img;
            }
            let (stem, ext) = split_name(&img.name);
            let mut n = 2;
            loop {
                let candidate = format!("{stem} ({n}){ext}");
                if seen.insert(candidate.clone()) {
                    debug!("Renamed duplicate '{}' → '{}'", img.name, candidate);
                    img.name = candidate;
                    return img;
                }
                n += 1;
            }
        })
        .collect()
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}
