//! Atomic file replacement.
//!
//! Every component that rewrites the live worker source, a snapshot
//! target, or the history log goes through `write_atomic`: the other
//! control loop may read the file between polls, so a partially-written
//! file must never be observable.

use std::io;
use std::path::{Path, PathBuf};

/// Temp-file sibling used for the write-then-rename dance.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| "file".into(), std::ffi::OsStr::to_os_string);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` atomically: write a sibling temp file,
/// then rename it over the destination. Creates parent directories as
/// needed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_sibling(path);
    tokio::fs::write(&tmp, contents).await?;
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(err)
        }
    }
}
