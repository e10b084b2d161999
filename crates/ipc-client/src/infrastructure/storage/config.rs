//! TOML configuration for the `ipc-ctl` tool.
//!
//! Read from an explicit `--config` path or the platform default:
//! - Windows:  `%APPDATA%\IpcCtl\ipc.toml`
//! - Linux:    `~/.config/ipcctl/ipc.toml`
//! - macOS:    `~/Library/Application Support/IpcCtl/ipc.toml`
//!
//! ```toml
//! [device]
//! host = "192.168.1.20"
//! username = "admin"
//!
//! [api]
//! connect_timeout_secs = 5
//! request_timeout_secs = 10
//!
//! [talk]
//! control_port = 554
//! ffmpeg_path = "ffmpeg"
//! initial_delay_ms = 2500
//! poll_interval_ms = 2000
//! response_timeout_secs = 10
//!
//! [media]
//! base_url = "http://192.168.1.5:8123"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and every field may be omitted; missing values fall back to
//! the defaults shown above.  The device password is deliberately absent
//! from the schema: it is only ever supplied on the command line or through
//! the `IPC_PASSWORD` environment variable.  The file is never written.

use std::{path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

/// Name of the configuration file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "ipc.toml";

/// Floor for `talk.poll_interval_ms`; `0` would spin the relay loop.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub api: ApiConfig,
    pub talk: TalkConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

/// Which camera to talk to.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Bare host or IP address.  No default: must come from here or `--host`.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_username")]
    pub username: String,
}

/// Control API timeouts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Talk channel and relay settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TalkConfig {
    /// RTSP control port used for MULTITRANS.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    /// Transcoder executable name or path.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Audio delay applied by the transcoder before the first sample.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// How often the relay checks transcoder liveness while idle.  Values
    /// below [`MIN_POLL_INTERVAL_MS`] are raised to it.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-response read limit during the handshake.  `0` waits forever.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

/// Where relative media paths are resolved.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MediaConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level filter: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_username() -> String {
    "admin".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_control_port() -> u16 {
    554
}
fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}
fn default_initial_delay_ms() -> u64 {
    2500
}
fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_response_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: default_username(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TalkConfig {
    fn default() -> Self {
        Self {
            control_port: default_control_port(),
            ffmpeg_path: default_ffmpeg_path(),
            initial_delay_ms: default_initial_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl TalkConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    /// `None` when the handshake should wait indefinitely.
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_secs > 0).then(|| Duration::from_secs(self.response_timeout_secs))
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads configuration from an explicit `path`.  The file must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Loads the default config file, returning `AppConfig::default()` if it
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config directory including the `IpcCtl` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("IpcCtl"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("ipcctl"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("IpcCtl"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
