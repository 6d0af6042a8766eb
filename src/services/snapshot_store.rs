//! Content backups of the worker source.
//!
//! A snapshot is taken before every restart-inducing change, and the
//! most recent one is the rollback target once self-correction gives
//! up. Snapshot files are named `<source-name>.<unix-millis>.snap` so
//! the file name alone encodes both the source identity and the
//! creation time; nothing here is ever garbage-collected.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::Snapshot;
use crate::infrastructure::fs::write_atomic;

const SNAPSHOT_SUFFIX: &str = ".snap";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("source file has no file name: {0}")]
    InvalidSource(PathBuf),
}

/// Directory of timestamped backup copies, one file per snapshot.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Copy the current content of `source` into a new snapshot.
    pub async fn backup(&self, source: &Path) -> Result<Snapshot, SnapshotError> {
        let source_name = file_name(source)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = tokio::fs::read(source).await?;
        let created_at = Utc::now();

        // Bump the timestamp on a name collision so rapid successive
        // backups stay distinct and ordered.
        let mut millis = created_at.timestamp_millis();
        let path = loop {
            let candidate = self
                .dir
                .join(format!("{source_name}.{millis}{SNAPSHOT_SUFFIX}"));
            if !candidate.exists() {
                break candidate;
            }
            millis += 1;
        };

        tokio::fs::write(&path, &bytes).await?;
        info!(snapshot = %path.display(), bytes = bytes.len(), "snapshot created");

        Ok(Snapshot {
            source_name,
            created_at: DateTime::from_timestamp_millis(millis).unwrap_or(created_at),
            path,
        })
    }

    /// The snapshot of `source` with the greatest creation time, if any.
    pub async fn latest(&self, source: &Path) -> Result<Option<Snapshot>, SnapshotError> {
        let source_name = file_name(source)?;
        let prefix = format!("{source_name}.");

        let mut newest: Option<Snapshot> = None;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(millis) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(SNAPSHOT_SUFFIX))
                .and_then(|stamp| stamp.parse::<i64>().ok())
            else {
                continue;
            };
            let Some(created_at) = DateTime::from_timestamp_millis(millis) else {
                continue;
            };

            if newest
                .as_ref()
                .is_none_or(|snapshot| created_at > snapshot.created_at)
            {
                newest = Some(Snapshot {
                    source_name: source_name.clone(),
                    created_at,
                    path: entry.path(),
                });
            }
        }

        debug!(
            source = %source.display(),
            found = newest.is_some(),
            "selected latest snapshot"
        );
        Ok(newest)
    }

    /// Overwrite the live file with the snapshot content. Atomic: the
    /// live file is never observable half-written.
    pub async fn restore(&self, source: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let bytes = tokio::fs::read(&snapshot.path).await?;
        write_atomic(source, &bytes).await?;
        info!(
            source = %source.display(),
            snapshot = %snapshot.path.display(),
            "restored source from snapshot"
        );
        Ok(())
    }
}

fn file_name(source: &Path) -> Result<String, SnapshotError> {
    source
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| SnapshotError::InvalidSource(source.to_path_buf()))
}
