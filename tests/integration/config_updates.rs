//! Runtime configuration updates through the watcher

use assert_matches::assert_matches;
use heimdall::config::{BaseSettings, ConfigError, RuntimeConfigStore};
use serde_json::{Value, json};
use tempfile::tempdir;

use super::helpers::{PRIMARY, memory_watcher};

#[tokio::test]
async fn test_timeout_above_interval_is_rejected() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    watcher
        .update_runtime_config(&json!({"poll_interval": 10, "ping_timeout": 5}))
        .await
        .unwrap();

    let err = watcher
        .update_runtime_config(&json!({"ping_timeout": 15}))
        .await
        .unwrap_err();

    assert_matches!(err, ConfigError::Invalid(msg) if msg == "ping_timeout cannot be greater than poll_interval.");
    let view = watcher.runtime_config().await;
    assert_eq!(view.poll_interval, 10);
    assert_eq!(view.ping_timeout, 5);
}

#[tokio::test]
async fn test_update_is_persisted_for_next_start() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());

    watcher
        .update_runtime_config(&json!({"ping_targets": "9.9.9.9, 1.1.1.1", "poll_interval": "45"}))
        .await
        .unwrap();

    let settings_path = dir.path().join("heimdall.settings.json");
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(written["PING_TARGETS"], json!(["9.9.9.9", "1.1.1.1"]));
    assert_eq!(written["POLL_INTERVAL"], json!(45));

    let restarted = RuntimeConfigStore::load(&BaseSettings::default(), settings_path)
        .await
        .unwrap();
    let config = restarted.snapshot().await;
    assert_eq!(config.targets, vec!["9.9.9.9", "1.1.1.1"]);
    assert_eq!(config.poll_interval, 45);
    assert_eq!(config.ping_timeout, 1);
}

#[tokio::test]
async fn test_view_reports_first_target_and_settings_path() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());

    let view = watcher.runtime_config().await;

    assert_eq!(view.ping_target.as_deref(), Some(PRIMARY));
    assert!(view.settings_file.ends_with("heimdall.settings.json"));
}

#[tokio::test]
async fn test_legacy_single_target_file_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(&path, r#"{"PING_TARGET": "192.168.1.1", "PING_TIMEOUT": 3}"#).unwrap();

    let store = RuntimeConfigStore::load(&BaseSettings::default(), path)
        .await
        .unwrap();
    let config = store.snapshot().await;

    assert_eq!(config.targets, vec!["192.168.1.1"]);
    assert_eq!(config.ping_timeout, 3);
    assert_eq!(config.poll_interval, 10);
}
