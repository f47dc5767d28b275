//! Tests for HistoryService

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use pylaunch::application::services::{HistoryService, HISTORY_FILE, MAX_HISTORY};
use pylaunch::domain::HistoryEntry;
use pylaunch::infrastructure::traits::RealFileSystem;

fn service(dir: &TempDir) -> HistoryService {
    HistoryService::new(Arc::new(RealFileSystem), dir.path())
}

#[test]
fn given_no_history_file_when_loading_then_empty() {
    let temp = TempDir::new().unwrap();
    assert!(service(&temp).load().is_empty());
}

#[test]
fn given_record_when_loading_then_entry_persisted_with_type_key() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let history = service(&temp);

    // Act
    let entry = history
        .record("main.py", "/srv/app/main.py", "python project")
        .unwrap();

    // Assert
    assert_eq!(history.load(), vec![entry.clone()]);
    assert_eq!(entry.timestamp.len(), "2024-01-31 12:00:00".len());
    let raw = fs::read_to_string(temp.path().join(HISTORY_FILE)).unwrap();
    assert!(raw.contains("\"type\": \"python script\""), "{raw}");
}

#[test]
fn given_more_than_max_records_when_recording_then_keeps_newest() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let history = service(&temp);

    // Act
    for i in 0..MAX_HISTORY + 5 {
        history
            .record(&format!("script{i}.py"), "/tmp/x.py", "python project")
            .unwrap();
    }

    // Assert
    let entries = history.load();
    assert_eq!(entries.len(), MAX_HISTORY);
    assert_eq!(entries[0].name, "script5.py");
    assert_eq!(
        entries.last().unwrap().name,
        format!("script{}.py", MAX_HISTORY + 4)
    );
}

#[test]
fn given_corrupt_file_when_recording_then_starts_fresh() {
    // Arrange
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(HISTORY_FILE), "{ not json").unwrap();
    let history = service(&temp);

    // Act
    assert!(history.load().is_empty());
    history.record("main.py", "/a/main.py", "python project").unwrap();

    // Assert
    assert_eq!(history.load().len(), 1);
}

#[test]
fn given_oversized_file_when_loading_then_truncated_to_newest() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let entries: Vec<HistoryEntry> = (0..MAX_HISTORY + 10)
        .map(|i| HistoryEntry {
            timestamp: "2024-01-01 00:00:00".into(),
            name: format!("s{i}.py"),
            path: format!("/x/s{i}.py"),
            kind: "python project".into(),
        })
        .collect();
    fs::write(
        temp.path().join(HISTORY_FILE),
        serde_json::to_string(&entries).unwrap(),
    )
    .unwrap();

    // Act
    let loaded = service(&temp).load();

    // Assert
    assert_eq!(loaded.len(), MAX_HISTORY);
    assert_eq!(loaded[0].name, "s10.py");
}

#[test]
fn given_history_when_clearing_then_empty_array_written() {
    let temp = TempDir::new().unwrap();
    let history = service(&temp);
    history.record("main.py", "/a/main.py", "python project").unwrap();

    history.clear().unwrap();

    assert!(history.load().is_empty());
    assert_eq!(
        fs::read_to_string(temp.path().join(HISTORY_FILE)).unwrap().trim(),
        "[]"
    );
}
