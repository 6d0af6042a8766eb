//! Git adapter tests against throwaway repositories.
//!
//! Skipped silently when no `git` binary is on the PATH.

use std::path::Path;
use symbiont::domain::ports::{CommitOutcome, VersionControl};
use symbiont::infrastructure::git::GitClient;
use tokio::process::Command;

async fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

async fn init_repo(repo: &Path) {
    git(repo, &["init", "--quiet"]).await;
    git(repo, &["config", "user.email", "tests@example.com"]).await;
    git(repo, &["config", "user.name", "Tests"]).await;
}

async fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .await
        .is_ok()
}

#[tokio::test]
async fn add_and_commit_records_the_change() {
    if !git_available().await {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path()).await;

    let file = dir.path().join("worker.py");
    tokio::fs::write(&file, "print('v1')\n").await.unwrap();

    let client = GitClient::new(dir.path());
    client.add(&file).await.unwrap();
    let outcome = client.commit("feat(evolve): first version").await.unwrap();
    assert_eq!(outcome, CommitOutcome::Committed);
}

#[tokio::test]
async fn unchanged_content_is_nothing_to_commit() {
    if !git_available().await {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path()).await;

    let file = dir.path().join("worker.py");
    tokio::fs::write(&file, "print('v1')\n").await.unwrap();

    let client = GitClient::new(dir.path());
    client.add(&file).await.unwrap();
    assert_eq!(
        client.commit("feat(evolve): first version").await.unwrap(),
        CommitOutcome::Committed
    );

    // Re-adding identical content stages nothing new.
    client.add(&file).await.unwrap();
    assert_eq!(
        client.commit("feat(evolve): no-op").await.unwrap(),
        CommitOutcome::NothingToCommit
    );

    tokio::fs::write(&file, "print('v2')\n").await.unwrap();
    client.add(&file).await.unwrap();
    assert_eq!(
        client.commit("feat(evolve): second version").await.unwrap(),
        CommitOutcome::Committed
    );
}
