//! Reachability probes
//!
//! A [`Probe`] answers one question: did `host` respond within `timeout`?
//! Every failure mode (timeout, unknown host, missing executable, non-zero
//! exit, misreported unreachable) is a plain `false`; nothing escapes as an
//! error.
//!
//! [`resolve`] turns a target list into a single verdict: the network is
//! up if any target answers.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

pub mod ping;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

pub use ping::{PingPlatform, PingProbe};
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedProbe;

/// A single reachability check
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host: &str, timeout: Duration) -> bool;
}

/// Probe targets in order and stop at the first one that answers
///
/// Returns `false` only when every target failed (or the list is empty).
#[instrument(skip(probe), fields(targets = targets.len()))]
pub async fn resolve(probe: &dyn Probe, targets: &[String], timeout: Duration) -> bool {
    for target in targets {
        if probe.probe(target, timeout).await {
            trace!("{target} answered");
            return true;
        }
        trace!("{target} did not answer");
    }

    debug!("no target answered");
    false
}
