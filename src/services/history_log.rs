//! Persistent record of evolution iterations.
//!
//! Append-only in effect, though each update rewrites the whole file:
//! the log is serialized in full to a temp sibling and renamed into
//! place, so the file on disk is always valid JSON even if the process
//! dies mid-update. Loaded once at startup; a log that fails to parse
//! is treated as empty, never as fatal.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::models::HistoryEntry;
use crate::infrastructure::fs::write_atomic;

/// The ordered sequence of every recorded iteration outcome.
pub struct HistoryLog {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Load the log at `path`, or start empty if it is missing or
    /// unreadable.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<Vec<HistoryEntry>>(&text) {
                Ok(entries) => {
                    info!(count = entries.len(), path = %path.display(), "loaded history log");
                    entries
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "history log is corrupt; starting fresh");
                    vec![]
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => vec![],
            Err(err) => {
                warn!(path = %path.display(), %err, "history log unreadable; starting fresh");
                vec![]
            }
        };

        Self { path, entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The iteration number the next entry should carry. Monotonic
    /// across restarts because it is derived from the loaded length.
    #[must_use]
    pub fn next_iteration(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    /// Record an entry and persist the whole log.
    ///
    /// I/O failure here is fatal to the caller: an orchestrator that
    /// cannot record outcomes must not keep iterating.
    pub async fn append(&mut self, entry: HistoryEntry) -> io::Result<()> {
        self.entries.push(entry);
        let json = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        write_atomic(&self.path, &json).await?;
        info!(count = self.entries.len(), path = %self.path.display(), "history log updated");
        Ok(())
    }

    /// Compact summary of the most recent `limit` entries, for prompts.
    #[must_use]
    pub fn recent_summary(&self, limit: usize) -> String {
        if self.entries.is_empty() {
            return "No history yet.".to_string();
        }

        let skip = self.entries.len().saturating_sub(limit);
        let mut summary = String::new();
        for entry in &self.entries[skip..] {
            let _ = writeln!(
                summary,
                "- iteration {}: status = {}, reason = {}",
                entry.iteration, entry.status, entry.reason
            );
        }
        summary
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
