use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from the version-control collaborator.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("version-control executable not found: {0}")]
    NotFound(String),

    #[error("`{command}` exited with {code:?}; stdout: {stdout}; stderr: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("i/o running version-control command: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a commit attempt.
///
/// "Nothing to commit" is a distinguished non-error outcome: the staged
/// tree already matched HEAD, so there was no difference to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
}

/// Version-control collaborator used to persist accepted proposals.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn add(&self, path: &Path) -> Result<(), VcsError>;

    async fn commit(&self, message: &str) -> Result<CommitOutcome, VcsError>;
}
