//! Probe with scripted answers
//!
//! Stands in for the ping executable wherever the answer must be known in
//! advance: queued answers are consumed first, then the host's fixed
//! answer applies, then the default (`false`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::Probe;

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<String, VecDeque<bool>>,
    fixed: HashMap<String, bool>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedProbe {
    script: Mutex<Script>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `up` for `host` from now on (after any queued answers)
    pub fn set(&self, host: &str, up: bool) {
        self.lock().fixed.insert(host.to_string(), up);
    }

    /// Queue one-shot answers for `host`
    pub fn push(&self, host: &str, answers: impl IntoIterator<Item = bool>) {
        self.lock()
            .queued
            .entry(host.to_string())
            .or_default()
            .extend(answers);
    }

    /// Hosts probed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, host: &str, _timeout: Duration) -> bool {
        let mut script = self.lock();
        script.calls.push(host.to_string());

        if let Some(answer) = script.queued.get_mut(host).and_then(VecDeque::pop_front) {
            return answer;
        }

        script.fixed.get(host).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_answers_before_fixed() {
        let probe = ScriptedProbe::new();
        probe.set("host", true);
        probe.push("host", [false, false]);

        let timeout = Duration::from_secs(1);
        assert!(!probe.probe("host", timeout).await);
        assert!(!probe.probe("host", timeout).await);
        assert!(probe.probe("host", timeout).await);
    }

    #[tokio::test]
    async fn test_unknown_host_is_down() {
        let probe = ScriptedProbe::new();
        assert!(!probe.probe("nowhere", Duration::from_secs(1)).await);
    }
}
