use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// An immutable, timestamped backup copy of a source file.
///
/// Snapshots are never mutated after creation and are ordered by
/// `created_at`; the store file name encodes both the source identity
/// and the creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// File name of the source this snapshot backs up.
    pub source_name: String,
    /// Creation time, also the ordering key.
    pub created_at: DateTime<Utc>,
    /// Location of the snapshot copy on disk.
    pub path: PathBuf,
}
