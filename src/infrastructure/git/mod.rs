//! Git adapter for the version-control port.
//!
//! Shells out to the `git` CLI. The "nothing to commit" rule is decided
//! here, explicitly: after staging, `git diff --cached --quiet` exiting
//! clean means the index already matches HEAD and the commit is skipped
//! as a benign no-op. Every other non-zero git exit is a hard error
//! carrying the command, exit code, and captured output.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::ports::{CommitOutcome, VcsError, VersionControl};

/// Version-control adapter backed by the `git` CLI.
pub struct GitClient {
    repo_root: PathBuf,
}

impl GitClient {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        debug!(command = %format!("git {}", args.join(" ")), "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .await
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    VcsError::NotFound("git".to_string())
                } else {
                    VcsError::Io(err)
                }
            })
    }

    fn failure(args: &[&str], output: &Output) -> VcsError {
        VcsError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

#[async_trait]
impl VersionControl for GitClient {
    async fn add(&self, path: &Path) -> Result<(), VcsError> {
        let path_arg = path.to_string_lossy().into_owned();
        let args = ["add", "--", path_arg.as_str()];
        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(Self::failure(&args, &output));
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<CommitOutcome, VcsError> {
        // Index matching HEAD means there is no difference to record.
        let diff_args = ["diff", "--cached", "--quiet"];
        let diff = self.run(&diff_args).await?;
        match diff.status.code() {
            Some(0) => {
                info!("staged tree matches HEAD; nothing to commit");
                return Ok(CommitOutcome::NothingToCommit);
            }
            Some(1) => {}
            _ => return Err(Self::failure(&diff_args, &diff)),
        }

        let commit_args = ["commit", "-m", message];
        let output = self.run(&commit_args).await?;
        if !output.status.success() {
            return Err(Self::failure(&commit_args, &output));
        }
        info!(message, "created commit");
        Ok(CommitOutcome::Committed)
    }
}
