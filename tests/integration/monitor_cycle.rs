//! End-to-end monitor cycles against scripted probes and in-memory storage

use heimdall::monitor::Transition;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::helpers::{BACKUP, PRIMARY, memory_watcher, start_scripted};

#[tokio::test]
async fn test_outage_is_opened_and_closed() {
    let dir = tempdir().unwrap();
    let (watcher, storage) = memory_watcher(dir.path());
    start_scripted(&watcher, &[true, false, false, true]).await;

    let down = watcher.check_now().await.unwrap();
    assert_eq!(down.transition, Transition::WentDown);

    let open = watcher.get_current_downtime().await.unwrap().unwrap();
    assert_eq!(open.started_at, down.at);
    assert!(watcher.get_recent_downtimes(10).await.unwrap().is_empty());

    watcher.check_now().await.unwrap();
    let up = watcher.check_now().await.unwrap();
    assert_eq!(up.transition, Transition::CameUp);

    assert!(watcher.get_current_downtime().await.unwrap().is_none());
    let closed = watcher.get_recent_downtimes(1).await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, open.id);
    assert_eq!(closed[0].started_at, down.at);
    assert_eq!(closed[0].ended_at, Some(up.at));

    assert_eq!(storage.all_samples().len(), 4);
    let last = watcher.get_last_status_sample().await.unwrap().unwrap();
    assert!(last.up);
    assert_eq!(last.at, up.at);
}

#[tokio::test]
async fn test_status_tracks_last_change() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    start_scripted(&watcher, &[true, true, false, false]).await;

    let first = watcher.get_status().await;
    assert_eq!(first.up, Some(true));
    assert_eq!(first.last_change, None);

    watcher.check_now().await.unwrap();
    let change = watcher.check_now().await.unwrap();
    let steady = watcher.check_now().await.unwrap();

    let status = watcher.get_status().await;
    assert_eq!(status.up, Some(false));
    assert_eq!(status.last_change, Some(change.at));
    assert_eq!(status.last_check, Some(steady.at));
}

#[tokio::test]
async fn test_backup_target_keeps_network_up() {
    let dir = tempdir().unwrap();
    let (watcher, storage) = memory_watcher(dir.path());
    let probe = start_scripted(&watcher, &[true]).await;
    probe.set(PRIMARY, false);
    probe.set(BACKUP, true);

    let report = watcher.check_now().await.unwrap();

    assert!(report.up);
    assert_eq!(report.transition, Transition::Steady);
    assert!(storage.all_downtimes().is_empty());
}

#[tokio::test]
async fn test_all_targets_down_opens_one_row() {
    let dir = tempdir().unwrap();
    let (watcher, storage) = memory_watcher(dir.path());
    let probe = start_scripted(&watcher, &[true]).await;
    probe.set(PRIMARY, false);
    probe.set(BACKUP, false);

    for _ in 0..3 {
        watcher.check_now().await.unwrap();
    }

    let rows = storage.all_downtimes();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_open());
}

#[tokio::test]
async fn test_new_targets_apply_to_next_cycle() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let probe = start_scripted(&watcher, &[false]).await;
    probe.set("fresh.example", true);

    watcher
        .update_runtime_config(&serde_json::json!({"ping_targets": ["fresh.example"]}))
        .await
        .unwrap();
    let report = watcher.check_now().await.unwrap();

    assert!(report.up);
    assert_eq!(report.transition, Transition::CameUp);
    assert_eq!(probe.calls().last().map(String::as_str), Some("fresh.example"));
}
