use std::time::Duration;

use chrono::{TimeZone, Utc};
use deploy::{DeploymentStatus, RepositoryId, Timestamp};

use super::*;

fn id(raw: &str) -> RepositoryId {
    RepositoryId::new(raw).unwrap()
}

fn sample_snapshot() -> StatusSnapshot {
    let attempt = Timestamp::from_utc(Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap());
    let success = Timestamp::from_utc(Utc.timestamp_opt(1_700_000_004, 0).unwrap());

    let mut snapshot = StatusSnapshot::new();
    snapshot.insert(
        id("app"),
        DeploymentStatus {
            last_attempt: Some(attempt),
            last_success: Some(success),
            last_exit_code: Some(0),
            last_duration: Some(Duration::from_millis(4_000)),
            last_error: None,
        },
    );
    snapshot.insert(
        id("web"),
        DeploymentStatus {
            last_attempt: Some(attempt),
            last_success: None,
            last_exit_code: Some(2),
            last_duration: Some(Duration::from_millis(15)),
            last_error: Some(deploy::FAILURE_MARKER.to_string()),
        },
    );
    snapshot
}

#[tokio::test]
async fn test_missing_file_loads_as_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStatusStore::new(dir.path().join("status.json"));

    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_snapshot_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStatusStore::new(dir.path().join("status.json"));
    let snapshot = sample_snapshot();

    store.save(&snapshot).await.unwrap();

    assert_eq!(store.load().await.unwrap(), snapshot);
}

#[tokio::test]
async fn test_save_overwrites_the_whole_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStatusStore::new(dir.path().join("status.json"));
    store.save(&sample_snapshot()).await.unwrap();

    let mut smaller = StatusSnapshot::new();
    smaller.insert(id("app"), DeploymentStatus::default());
    store.save(&smaller).await.unwrap();

    assert_eq!(store.load().await.unwrap(), smaller);
    assert!(!store.temp_path().exists());
}

#[tokio::test]
async fn test_save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStatusStore::new(dir.path().join("var/lib/status.json"));

    store.save(&sample_snapshot()).await.unwrap();

    assert!(store.path().exists());
}

#[tokio::test]
async fn test_file_uses_the_status_feed_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStatusStore::new(dir.path().join("status.json"));
    store.save(&sample_snapshot()).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();

    assert_eq!(raw["app"]["lastExitCode"], 0);
    assert_eq!(raw["app"]["lastDuration"], 4_000);
    assert_eq!(raw["app"]["lastError"], serde_json::Value::Null);
    assert_eq!(raw["web"]["lastError"], deploy::FAILURE_MARKER);
}

#[tokio::test]
async fn test_corrupt_file_is_reported_not_panicked_on() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, b"{\"app\": {\"lastAttempt\": ").unwrap();
    let store = JsonFileStatusStore::new(&path);

    let err = store.load().await.unwrap_err();

    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[tokio::test]
async fn test_unwritable_location_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let store = JsonFileStatusStore::new(blocker.join("status.json"));

    let err = store.save(&sample_snapshot()).await.unwrap_err();

    assert!(matches!(err, StoreError::Write { .. }));
}
