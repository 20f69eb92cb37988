//! ffmpeg concat demuxer lists.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::MediaResult;

/// One clip of a concat list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    /// Seconds to skip at the start of the clip
    pub inpoint: f64,
}

/// Render entries in concat demuxer syntax.
pub fn render_concat_list(entries: &[ConcatEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "file '{}'\ninpoint {}\n",
            escape_path(&entry.path),
            entry.inpoint
        ));
    }
    out
}

/// Write a concat list to `path`, replacing any existing file.
pub async fn write_concat_list(path: impl AsRef<Path>, entries: &[ConcatEntry]) -> MediaResult<()> {
    fs::write(path, render_concat_list(entries)).await?;
    Ok(())
}

/// Quote for a single-quoted concat directive: `'` becomes `'\''`.
fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}
