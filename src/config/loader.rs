//! Configuration file loading with precedence handling.

use crate::model::{ClientId, ConfigurationError, MessageKind};
use crate::pipeline::PipelineSettings;
use crate::session::{ConnectTarget, ReconnectPolicy, SessionConfig};
use crate::view_state::EngineSettings;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Default stream endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting parsed but its value is unusable.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Setting name as it appears in the file.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/livelog/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Stream endpoint, e.g. `ws://localhost:8000/ws`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Client identifier announced on connect.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Message kind routed into the log pane.
    #[serde(default)]
    pub kind: Option<String>,

    /// Delay before reconnecting, in milliseconds.
    #[serde(default)]
    pub reconnect_delay_ms: Option<u64>,

    /// Upper bound for exponential reconnect delay. Absent means fixed delay.
    #[serde(default)]
    pub max_reconnect_delay_ms: Option<u64>,

    /// Rows assumed for a record before it is measured.
    #[serde(default)]
    pub estimated_row_height: Option<u16>,

    /// Extra records laid out beyond each viewport edge.
    #[serde(default)]
    pub overscan: Option<usize>,

    /// Maximum records retained; oldest are evicted beyond it.
    #[serde(default)]
    pub buffer_capacity: Option<usize>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Stream endpoint.
    pub endpoint: String,
    /// Client identifier. `None` means a random UUID per run.
    pub client_id: Option<String>,
    /// Message kind shown in the log pane.
    pub kind: String,
    /// Reconnect delay in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Exponential backoff cap in milliseconds.
    pub max_reconnect_delay_ms: Option<u64>,
    /// Estimated row height before measurement.
    pub estimated_row_height: u16,
    /// Overscan in records.
    pub overscan: usize,
    /// Buffer capacity. `None` keeps everything.
    pub buffer_capacity: Option<usize>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client_id: None,
            kind: MessageKind::LIVE_LOG.to_string(),
            reconnect_delay_ms: 1_000,
            max_reconnect_delay_ms: None,
            estimated_row_height: 1,
            overscan: 5,
            buffer_capacity: Some(10_000),
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Connection settings for a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for an empty client id or a zero reconnect delay.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect_delay_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        let client_id = match &self.client_id {
            Some(raw) => ClientId::new(raw.as_str()).map_err(|e| ConfigError::InvalidValue {
                field: "client_id",
                reason: e.to_string(),
            })?,
            None => ClientId::random(),
        };
        Ok(SessionConfig {
            target: ConnectTarget::new(self.endpoint.clone(), client_id),
            policy: ReconnectPolicy::from_millis(
                self.reconnect_delay_ms,
                self.max_reconnect_delay_ms,
            ),
        })
    }

    /// The kind routed into the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when the kind is empty.
    pub fn message_kind(&self) -> Result<MessageKind, ConfigError> {
        MessageKind::new(self.kind.as_str()).map_err(|e| ConfigError::InvalidValue {
            field: "kind",
            reason: e.to_string(),
        })
    }

    /// Buffer and virtualization settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for a zero row height.
    pub fn pipeline_settings(&self) -> Result<PipelineSettings, ConfigurationError> {
        Ok(PipelineSettings {
            engine: EngineSettings::new(self.estimated_row_height, self.overscan)?,
            capacity: self.buffer_capacity,
        })
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/livelog/livelog.log` on Linux, the platform
/// equivalent elsewhere, or `livelog.log` in the working directory when no
/// state directory exists.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("livelog").join("livelog.log")
    } else {
        PathBuf::from("livelog.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/livelog/config.toml` on Linux, or `None` when the
/// platform has no config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("livelog").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `LIVELOG_CONFIG` environment variable
/// 3. Default path `~/.config/livelog/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Some(env_path) = std::env::var_os("LIVELOG_CONFIG") {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath("LIVELOG_CONFIG is empty".to_string()));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        endpoint: config.endpoint.unwrap_or(defaults.endpoint),
        client_id: config.client_id.or(defaults.client_id),
        kind: config.kind.unwrap_or(defaults.kind),
        reconnect_delay_ms: config
            .reconnect_delay_ms
            .unwrap_or(defaults.reconnect_delay_ms),
        max_reconnect_delay_ms: config
            .max_reconnect_delay_ms
            .or(defaults.max_reconnect_delay_ms),
        estimated_row_height: config
            .estimated_row_height
            .unwrap_or(defaults.estimated_row_height),
        overscan: config.overscan.unwrap_or(defaults.overscan),
        buffer_capacity: config.buffer_capacity.or(defaults.buffer_capacity),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `LIVELOG_ENDPOINT` and `LIVELOG_CLIENT_ID`.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(endpoint) = std::env::var("LIVELOG_ENDPOINT") {
        config.endpoint = endpoint;
    }

    if let Ok(client_id) = std::env::var("LIVELOG_CLIENT_ID") {
        config.client_id = Some(client_id);
    }

    config
}

/// Overrides collected from command-line flags. `None` leaves a value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--endpoint`
    pub endpoint: Option<String>,
    /// `--client-id`
    pub client_id: Option<String>,
    /// `--kind`
    pub kind: Option<String>,
    /// `--capacity`
    pub capacity: Option<usize>,
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: CliOverrides) -> ResolvedConfig {
    if let Some(endpoint) = overrides.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(client_id) = overrides.client_id {
        config.client_id = Some(client_id);
    }
    if let Some(kind) = overrides.kind {
        config.kind = kind;
    }
    if let Some(capacity) = overrides.capacity {
        config.buffer_capacity = Some(capacity);
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
