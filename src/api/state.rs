//! API shared state

use crate::watcher::Watcher;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub watcher: Watcher,

    /// Port reported to dashboard clients
    pub port: u16,
}

impl ApiState {
    pub fn new(watcher: Watcher, port: u16) -> Self {
        Self { watcher, port }
    }
}
