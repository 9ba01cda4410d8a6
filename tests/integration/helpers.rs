//! Helper functions for integration tests

use std::path::Path;
use std::sync::Arc;

use heimdall::{
    Watcher,
    config::{RuntimeConfig, RuntimeConfigStore},
    probe::ScriptedProbe,
    storage::{StorageBackend, memory::MemoryBackend},
};

pub const PRIMARY: &str = "primary.example";
pub const BACKUP: &str = "backup.example";

/// Two targets, long interval so only explicit checks run after the first cycle
pub fn test_runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        targets: vec![PRIMARY.to_string(), BACKUP.to_string()],
        poll_interval: 3600,
        ping_timeout: 1,
    }
}

pub fn config_store(dir: &Path) -> RuntimeConfigStore {
    RuntimeConfigStore::new(test_runtime_config(), dir.join("heimdall.settings.json"))
}

pub fn watcher_with(storage: Arc<dyn StorageBackend>, dir: &Path) -> Watcher {
    Watcher::new(storage, config_store(dir))
}

pub fn memory_watcher(dir: &Path) -> (Watcher, Arc<MemoryBackend>) {
    let storage = Arc::new(MemoryBackend::new());
    (watcher_with(storage.clone(), dir), storage)
}

/// Start the monitor with a scripted probe; the first answer is consumed
/// by the cycle that runs on start
pub async fn start_scripted(watcher: &Watcher, answers: &[bool]) -> Arc<ScriptedProbe> {
    let probe = Arc::new(ScriptedProbe::new());
    probe.push(PRIMARY, answers.iter().copied());

    let _task = watcher.start_monitor(probe.clone()).unwrap();
    wait_for_first_cycle(watcher).await;
    probe
}

pub async fn wait_for_first_cycle(watcher: &Watcher) {
    for _ in 0..200 {
        if watcher.get_status().await.last_check.is_some() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("monitor did not complete its first cycle");
}
