//! SQLite-backed monitor runs and restarts

use std::sync::Arc;

use chrono::{Duration, Utc};
use heimdall::storage::{StorageBackend, sqlite::SqliteBackend};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::helpers::{start_scripted, watcher_with};

#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data").join("heimdall.db");

    let (started, ended) = {
        let storage = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let watcher = watcher_with(storage.clone(), dir.path());
        start_scripted(&watcher, &[true, false, true, false]).await;

        let down = watcher.check_now().await.unwrap();
        let up = watcher.check_now().await.unwrap();
        watcher.check_now().await.unwrap();
        storage.close().await.unwrap();
        (down.at, up.at)
    };

    let reopened = SqliteBackend::new(&db_path).await.unwrap();

    let closed = reopened.recent_downtimes(1).await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].started_at, started);
    assert_eq!(closed[0].ended_at, Some(ended));

    assert!(reopened.current_downtime().await.unwrap().is_some());

    let stats = reopened
        .uptime_stats(Utc::now() - Duration::hours(24), 10)
        .await
        .unwrap();
    assert_eq!(stats.samples, 4);
    assert_eq!(stats.uptime_pct, Some(50.0));
    assert_eq!(stats.downtime_seconds, Some(20));
}

#[tokio::test]
async fn test_stats_through_watcher_use_sqlite() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(SqliteBackend::new(dir.path().join("stats.db")).await.unwrap());
    let watcher = watcher_with(storage.clone(), dir.path());

    let empty = watcher.get_uptime_stats().await.unwrap();
    assert_eq!(empty.uptime_pct, None);
    assert_eq!(empty.samples, 0);
    assert_eq!(empty.downtime_seconds, None);

    let now = Utc::now();
    for i in 0..10 {
        storage
            .log_status(i < 7, now - Duration::seconds(10 * (10 - i)))
            .await
            .unwrap();
    }
    // Outside the 24 hour window
    storage
        .log_status(false, now - Duration::hours(25))
        .await
        .unwrap();

    watcher
        .update_runtime_config(&serde_json::json!({"poll_interval": 10}))
        .await
        .unwrap();
    let stats = watcher.get_uptime_stats().await.unwrap();

    assert_eq!(stats.samples, 10);
    assert_eq!(stats.uptime_pct, Some(70.0));
    assert_eq!(stats.downtime_seconds, Some(30));
}

#[tokio::test]
async fn test_storage_health_reports_sqlite() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(SqliteBackend::new(dir.path().join("health.db")).await.unwrap());
    let watcher = watcher_with(storage, dir.path());

    let health = watcher.storage_health().await.unwrap();
    assert!(health.healthy);
}
