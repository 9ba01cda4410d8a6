//! Heimdall - network connectivity watcher
//!
//! Periodically probes a list of hosts, decides whether the network is
//! "up" (any host answers) or "down" (none do), records downtime
//! intervals and per-cycle samples, and exposes the history to the HTTP
//! layer through [`watcher::Watcher`].

pub mod api;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod status;
pub mod storage;
pub mod watcher;

pub use status::{StatusSnapshot, StatusState};
pub use watcher::Watcher;
