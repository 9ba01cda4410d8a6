//! Runtime configuration: probe targets, poll interval and ping timeout
//!
//! ## Sources
//!
//! 1. Settings file (JSON object written by [`RuntimeConfigStore::update`])
//! 2. Flags / environment ([`BaseSettings`], filled by the binary)
//!
//! The settings file wins over the environment for every key it contains.
//!
//! ## Updates
//!
//! Updates arrive as loosely typed JSON (from the HTTP layer), are
//! validated in full, merged with the committed values, checked again
//! (`ping_timeout <= poll_interval`) and only then committed. A rejected
//! update leaves the committed configuration untouched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};

pub const DEFAULT_PING_TARGETS: &str = "8.8.8.8,1.1.1.1";
pub const DEFAULT_POLL_INTERVAL: u64 = 10;
pub const DEFAULT_PING_TIMEOUT: u64 = 5;

pub const MIN_POLL_INTERVAL: u64 = 1;
pub const MAX_POLL_INTERVAL: u64 = 3600;
pub const MIN_PING_TIMEOUT: u64 = 1;
pub const MAX_PING_TIMEOUT: u64 = 60;

/// Longest accepted host name / address
pub const MAX_TARGET_LEN: usize = 255;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading, validating or persisting configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Rejected value; the message is meant for the API caller
    Invalid(String),

    /// Settings file could not be written
    Io(std::io::Error),

    /// Settings could not be serialized
    Json(serde_json::Error),
}

impl ConfigError {
    fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(msg) => f.write_str(msg),
            ConfigError::Io(err) => write!(f, "failed to write settings file: {}", err),
            ConfigError::Json(err) => write!(f, "failed to encode settings: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid(_) => None,
            ConfigError::Io(err) => Some(err),
            ConfigError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn normalize_target(value: &str) -> ConfigResult<String> {
    let target = value.trim();
    if target.is_empty() {
        return Err(ConfigError::invalid("ping_target cannot be empty."));
    }
    if target.chars().count() > MAX_TARGET_LEN {
        return Err(ConfigError::invalid("ping_target is too long."));
    }
    Ok(target.to_string())
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a target list given as a comma-separated string or a list
///
/// Items are trimmed, blanks skipped, order kept and duplicates dropped.
pub fn normalize_targets(value: &Value) -> ConfigResult<Vec<String>> {
    let raw_items: Vec<String> = match value {
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Array(items) => items.iter().map(value_as_text).collect(),
        _ => {
            return Err(ConfigError::invalid(
                "ping_targets must be a comma-separated string or a list.",
            ));
        }
    };

    let mut targets: Vec<String> = Vec::with_capacity(raw_items.len());
    for item in raw_items {
        if item.trim().is_empty() {
            continue;
        }
        let target = normalize_target(&item)?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    if targets.is_empty() {
        return Err(ConfigError::invalid(
            "ping_targets must include at least one target.",
        ));
    }
    Ok(targets)
}

/// Parse an integer given as a JSON number or numeric string and range-check it
pub fn coerce_int(value: &Value, name: &str, min: u64, max: u64) -> ConfigResult<u64> {
    let not_an_integer = || ConfigError::invalid(format!("{name} must be an integer."));

    let parsed: i64 = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => f.trunc() as i64,
            _ => return Err(not_an_integer()),
        },
        Value::String(s) => s.trim().parse().map_err(|_| not_an_integer())?,
        _ => return Err(not_an_integer()),
    };

    if parsed < min as i64 {
        return Err(ConfigError::invalid(format!("{name} must be >= {min}.")));
    }
    if parsed > max as i64 {
        return Err(ConfigError::invalid(format!("{name} must be <= {max}.")));
    }
    Ok(parsed as u64)
}

// ============================================================================
// Runtime configuration
// ============================================================================

/// Values the monitor reads at the top of every cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub targets: Vec<String>,

    /// Seconds between cycles (1-3600)
    pub poll_interval: u64,

    /// Seconds to wait for a single echo reply (1-60, <= poll_interval)
    pub ping_timeout: u64,
}

impl RuntimeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout)
    }

    /// Build the startup configuration from the settings file and flags/env
    ///
    /// Unlike an update, a startup timeout above the interval is clamped
    /// down to the interval instead of being rejected.
    pub fn resolve(base: &BaseSettings, stored: &StoredSettings) -> ConfigResult<Self> {
        let targets = if let Some(targets) = &stored.ping_targets {
            normalize_targets(targets)?
        } else if let Some(target) = &stored.ping_target {
            normalize_targets(&Value::Array(vec![target.clone()]))?
        } else if let Some(target) = &base.ping_target {
            normalize_targets(&Value::Array(vec![Value::String(target.clone())]))?
        } else {
            normalize_targets(&Value::String(base.ping_targets.clone()))?
        };

        let poll_interval = coerce_int(
            stored
                .poll_interval
                .as_ref()
                .unwrap_or(&Value::from(base.poll_interval)),
            "poll_interval",
            MIN_POLL_INTERVAL,
            MAX_POLL_INTERVAL,
        )?;

        let ping_timeout = coerce_int(
            stored
                .ping_timeout
                .as_ref()
                .unwrap_or(&Value::from(base.ping_timeout)),
            "ping_timeout",
            MIN_PING_TIMEOUT,
            MAX_PING_TIMEOUT,
        )?;

        if ping_timeout > poll_interval {
            warn!("ping_timeout {ping_timeout}s exceeds poll_interval {poll_interval}s, clamping");
        }

        Ok(Self {
            targets,
            poll_interval,
            ping_timeout: ping_timeout.min(poll_interval),
        })
    }
}

/// Startup values from command-line flags and environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSettings {
    /// Comma-separated target list
    pub ping_targets: String,

    /// Single target; takes precedence over `ping_targets`
    pub ping_target: Option<String>,

    pub poll_interval: u64,
    pub ping_timeout: u64,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            ping_targets: DEFAULT_PING_TARGETS.to_string(),
            ping_target: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
        }
    }
}

/// Contents of the settings file
///
/// Values are kept loosely typed and validated by [`RuntimeConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(rename = "PING_TARGETS", default, skip_serializing_if = "Option::is_none")]
    pub ping_targets: Option<Value>,

    /// Single-target key written by older releases
    #[serde(rename = "PING_TARGET", default, skip_serializing_if = "Option::is_none")]
    pub ping_target: Option<Value>,

    #[serde(rename = "POLL_INTERVAL", default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<Value>,

    #[serde(rename = "PING_TIMEOUT", default, skip_serializing_if = "Option::is_none")]
    pub ping_timeout: Option<Value>,
}

impl StoredSettings {
    fn from_runtime(config: &RuntimeConfig) -> Self {
        Self {
            ping_targets: Some(Value::from(config.targets.clone())),
            ping_target: None,
            poll_interval: Some(Value::from(config.poll_interval)),
            ping_timeout: Some(Value::from(config.ping_timeout)),
        }
    }

    /// Read the settings file
    ///
    /// A missing file, unreadable file, invalid JSON or a non-object
    /// document all count as "no stored settings".
    pub async fn read(path: &Path) -> Self {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings file at {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("ignoring unreadable settings file {}: {e}", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }),
            Ok(_) => {
                warn!("ignoring settings file {}: not a JSON object", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Write the settings file as pretty JSON, creating its directory
    pub async fn write(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        trace!("wrote settings file {}", path.display());
        Ok(())
    }
}

/// A validated partial update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub targets: Option<Vec<String>>,
    pub poll_interval: Option<u64>,
    pub ping_timeout: Option<u64>,
}

impl ConfigUpdate {
    /// Validate an update payload
    ///
    /// Recognised keys: `ping_targets`, `ping_target` (replaces the list and
    /// wins over `ping_targets`), `poll_interval`, `ping_timeout`.
    pub fn from_json(payload: &Value) -> ConfigResult<Self> {
        let Value::Object(fields) = payload else {
            return Err(ConfigError::invalid("JSON body must be an object."));
        };

        let mut update = ConfigUpdate::default();

        if let Some(value) = fields.get("ping_targets") {
            update.targets = Some(normalize_targets(value)?);
        }
        if let Some(value) = fields.get("ping_target") {
            let target = match value {
                Value::Null => return Err(ConfigError::invalid("ping_target is required.")),
                other => normalize_target(&value_as_text(other))?,
            };
            update.targets = Some(vec![target]);
        }
        if let Some(value) = fields.get("poll_interval") {
            update.poll_interval = Some(coerce_int(
                value,
                "poll_interval",
                MIN_POLL_INTERVAL,
                MAX_POLL_INTERVAL,
            )?);
        }
        if let Some(value) = fields.get("ping_timeout") {
            update.ping_timeout = Some(coerce_int(
                value,
                "ping_timeout",
                MIN_PING_TIMEOUT,
                MAX_PING_TIMEOUT,
            )?);
        }

        if let (Some(interval), Some(timeout)) = (update.poll_interval, update.ping_timeout)
            && timeout > interval
        {
            return Err(ConfigError::invalid(
                "ping_timeout cannot be greater than poll_interval.",
            ));
        }

        if update == ConfigUpdate::default() {
            return Err(ConfigError::invalid("No supported config fields provided."));
        }

        Ok(update)
    }

    /// Merge with the committed values and check the combined record
    pub fn apply_to(&self, current: &RuntimeConfig) -> ConfigResult<RuntimeConfig> {
        let next = RuntimeConfig {
            targets: self
                .targets
                .clone()
                .unwrap_or_else(|| current.targets.clone()),
            poll_interval: self.poll_interval.unwrap_or(current.poll_interval),
            ping_timeout: self.ping_timeout.unwrap_or(current.ping_timeout),
        };

        if next.ping_timeout > next.poll_interval {
            return Err(ConfigError::invalid(
                "ping_timeout cannot be greater than poll_interval.",
            ));
        }

        Ok(next)
    }
}

/// Serialized view of the committed configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfigView {
    /// First target of the list
    pub ping_target: Option<String>,
    pub ping_targets: Vec<String>,
    pub poll_interval: u64,
    pub ping_timeout: u64,
    pub settings_file: String,
}

/// Lock-guarded holder of the committed runtime configuration
#[derive(Debug)]
pub struct RuntimeConfigStore {
    current: RwLock<RuntimeConfig>,
    settings_path: PathBuf,
}

impl RuntimeConfigStore {
    pub fn new(config: RuntimeConfig, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(config),
            settings_path: settings_path.into(),
        }
    }

    /// Resolve the startup configuration from `settings_path` and `base`
    #[instrument(skip(base))]
    pub async fn load(base: &BaseSettings, settings_path: PathBuf) -> ConfigResult<Self> {
        let stored = StoredSettings::read(&settings_path).await;
        let config = RuntimeConfig::resolve(base, &stored)?;

        info!(
            "monitoring {:?} every {}s (timeout {}s)",
            config.targets, config.poll_interval, config.ping_timeout
        );

        Ok(Self::new(config, settings_path))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Copy of the committed configuration
    pub async fn snapshot(&self) -> RuntimeConfig {
        self.current.read().await.clone()
    }

    pub async fn view(&self) -> RuntimeConfigView {
        let config = self.current.read().await;
        self.render(&config)
    }

    /// Validate, persist (when `persist` is set) and commit an update
    ///
    /// The settings file is written before the new values are committed;
    /// if writing fails the committed configuration is unchanged.
    #[instrument(skip(self, payload))]
    pub async fn update(&self, payload: &Value, persist: bool) -> ConfigResult<RuntimeConfigView> {
        let update = ConfigUpdate::from_json(payload)?;

        let mut current = self.current.write().await;
        let next = update.apply_to(&current)?;

        if persist {
            StoredSettings::from_runtime(&next)
                .write(&self.settings_path)
                .await?;
        }

        info!(
            "runtime config updated: targets {:?}, interval {}s, timeout {}s",
            next.targets, next.poll_interval, next.ping_timeout
        );
        *current = next;

        Ok(self.render(&current))
    }

    fn render(&self, config: &RuntimeConfig) -> RuntimeConfigView {
        RuntimeConfigView {
            ping_target: config.targets.first().cloned(),
            ping_targets: config.targets.clone(),
            poll_interval: config.poll_interval,
            ping_timeout: config.ping_timeout,
            settings_file: self.settings_path.display().to_string(),
        }
    }
}
