//! History log persistence tests.

use symbiont::domain::models::{HistoryEntry, IterationStatus};
use symbiont::services::HistoryLog;

#[tokio::test]
async fn persisted_entries_reload_in_order_with_unchanged_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evolution_log.json");

    let mut log = HistoryLog::load(&path).await;
    let entries = vec![
        HistoryEntry::new(1, IterationStatus::Committed, "added a greeting"),
        HistoryEntry::new(2, IterationStatus::RejectedValidationFailed, "syntax error"),
        HistoryEntry::new(3, IterationStatus::NoProposal, "model returned prose"),
        HistoryEntry::new(4, IterationStatus::ExecutionFailed, "commit failed"),
    ];
    for entry in &entries {
        log.append(entry.clone()).await.unwrap();
    }

    let reloaded = HistoryLog::load(&path).await;
    assert_eq!(reloaded.entries(), entries.as_slice());
}

#[tokio::test]
async fn iteration_numbering_continues_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evolution_log.json");

    let mut log = HistoryLog::load(&path).await;
    log.append(HistoryEntry::new(1, IterationStatus::Committed, "first"))
        .await
        .unwrap();
    log.append(HistoryEntry::new(2, IterationStatus::Committed, "second"))
        .await
        .unwrap();

    let reloaded = HistoryLog::load(&path).await;
    assert_eq!(reloaded.next_iteration(), 3);
}

#[tokio::test]
async fn corrupt_log_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evolution_log.json");
    tokio::fs::write(&path, "[{\"iteration\": 1,").await.unwrap();

    let log = HistoryLog::load(&path).await;
    assert!(log.is_empty());
    assert_eq!(log.next_iteration(), 1);
}

#[tokio::test]
async fn log_file_is_valid_json_after_every_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evolution_log.json");

    let mut log = HistoryLog::load(&path).await;
    for i in 1..=3 {
        log.append(HistoryEntry::new(i, IterationStatus::Committed, format!("change {i}")))
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), i as usize);
    }
}
