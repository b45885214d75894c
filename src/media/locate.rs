//! Locating the file a downloader produced.
//!
//! yt-dlp rewrites characters it cannot put in a filename (`/` becomes `⧸`,
//! `:` becomes `：` and so on), and post-processing can change the extension,
//! so the reported title and extension do not always name the file on disk.
//! The lookup is a best-effort heuristic, tried in order:
//!
//! 1. `<title>.<ext>` exactly
//! 2. any file named `<title>.*`
//! 3. a file whose stem equals the title once both are case-folded and
//!    reduced to alphanumerics
//! 4. the only finished file in the directory
//!
//! Each job has a directory of its own, so step 4 cannot pick up another
//! job's output.

use crate::error::FetchError;
use std::path::{Path, PathBuf};

const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp", "tmp"];

/// Whether `name` is an intermediate file a downloader leaves while working
pub fn is_partial_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.contains(".part-frag") {
        return true;
    }
    Path::new(&lower)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PARTIAL_EXTENSIONS.contains(&ext))
}

/// Find the produced file for `title` in `dir`
///
/// # Errors
///
/// [`FetchError::OutputNotFound`] when no step of the heuristic matches.
pub async fn locate_output(dir: &Path, title: &str, ext: &str) -> Result<PathBuf, FetchError> {
    let expected = format!("{title}.{ext}");
    if !expected.contains(['/', '\\']) {
        let path = dir.join(&expected);
        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Ok(path);
        }
    }

    let mut candidates = finished_files(dir).await;

    let prefix = format!("{title}.");
    if let Some((_, path)) = candidates.iter().find(|(name, _)| name.starts_with(&prefix)) {
        return Ok(path.clone());
    }

    let wanted = normalize(title);
    if !wanted.is_empty()
        && let Some((_, path)) = candidates
            .iter()
            .find(|(name, _)| normalize(stem(name)) == wanted)
    {
        tracing::debug!(title, path = %path.display(), "Matched output by normalized title");
        return Ok(path.clone());
    }

    if candidates.len() == 1 {
        let (_, path) = candidates.remove(0);
        tracing::debug!(title, path = %path.display(), "Using only file in job directory");
        return Ok(path);
    }

    Err(FetchError::OutputNotFound {
        title: title.to_string(),
    })
}

/// Finished regular files in `dir`, sorted by name
async fn finished_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return files;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_partial_file(&name) {
            continue;
        }
        files.push((name, entry.path()));
    }

    files.sort();
    files
}

fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
