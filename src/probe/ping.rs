//! ICMP echo probe backed by the system `ping` executable
//!
//! ## Platform differences
//!
//! - **Unix**: `ping -c 1 -W <seconds> <host>`; exit status 0 means a reply
//!   arrived.
//! - **Windows**: `ping -n 1 -w <milliseconds> <host>`; exit status 0 is
//!   also reported for "Destination net unreachable", so success
//!   additionally requires an echo reply line (`TTL=`) in the output.
//!
//! The child process is bounded by `timeout + PROBE_SLACK` and killed when
//! that wait expires.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, instrument, trace, warn};

use super::Probe;

/// Extra wait on top of the ping timeout before the child is killed
pub const PROBE_SLACK: Duration = Duration::from_secs(2);

static ECHO_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bttl=\d+").expect("echo reply pattern is a valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingPlatform {
    Unix,
    Windows,
}

impl PingPlatform {
    /// Platform of the running process
    pub fn detect() -> Self {
        if cfg!(windows) {
            PingPlatform::Windows
        } else {
            PingPlatform::Unix
        }
    }

    /// Command-line arguments for a single echo request
    pub fn args(&self, host: &str, timeout: Duration) -> Vec<String> {
        match self {
            PingPlatform::Unix => vec![
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                timeout.as_secs().max(1).to_string(),
                host.to_string(),
            ],
            PingPlatform::Windows => vec![
                "-n".to_string(),
                "1".to_string(),
                "-w".to_string(),
                timeout.as_millis().max(1).to_string(),
                host.to_string(),
            ],
        }
    }

    /// Decide from the finished process whether an echo reply arrived
    pub fn is_reachable(&self, exit_success: bool, stdout: &str, stderr: &str) -> bool {
        if !exit_success {
            return false;
        }

        match self {
            PingPlatform::Unix => true,
            PingPlatform::Windows => ECHO_REPLY.is_match(stdout) || ECHO_REPLY.is_match(stderr),
        }
    }
}

/// Probe that shells out to `ping`
#[derive(Debug, Clone)]
pub struct PingProbe {
    platform: PingPlatform,
    program: String,
}

impl PingProbe {
    pub fn new() -> Self {
        Self::with_platform(PingPlatform::detect())
    }

    pub fn with_platform(platform: PingPlatform) -> Self {
        Self {
            platform,
            program: "ping".to_string(),
        }
    }

    /// Use a different executable (e.g. an absolute path to `ping`)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn platform(&self) -> PingPlatform {
        self.platform
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for PingProbe {
    #[instrument(skip(self))]
    async fn probe(&self, host: &str, timeout: Duration) -> bool {
        // Would be parsed as an option by ping
        if host.starts_with('-') {
            warn!("refusing to ping {host:?}");
            return false;
        }

        let mut command = Command::new(&self.program);
        command
            .args(self.platform.args(host, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout + PROBE_SLACK, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("failed to run {}: {e}", self.program);
                return false;
            }
            Err(_) => {
                debug!("{} did not finish within {:?}", self.program, timeout + PROBE_SLACK);
                return false;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reachable = self
            .platform
            .is_reachable(output.status.success(), &stdout, &stderr);

        trace!("{host}: exit {:?}, reachable = {reachable}", output.status.code());
        reachable
    }
}
