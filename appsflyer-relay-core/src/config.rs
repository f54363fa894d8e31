//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/appsflyer-relay/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/appsflyer-relay/` (~/.config/appsflyer-relay/)
//! - State/Logs: `$XDG_STATE_HOME/appsflyer-relay/` (~/.local/state/appsflyer-relay/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default in-app events API base URL
pub const DEFAULT_BASE_URL: &str = "https://api2.appsflyer.com/inappevent/";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Destination settings
    #[serde(default)]
    pub appsflyer: Settings,

    /// HTTP transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// AppsFlyer destination settings
///
/// Shared read-only by every event an adapter instance delivers. Accepts both
/// snake_case keys and the camelCase names used by the routing platform.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Dev key sent as the `authentication` header (required)
    #[serde(default, alias = "appsFlyerDevKey")]
    pub dev_key: String,

    /// Numeric Apple App ID, without the `id` prefix (required for iOS events)
    #[serde(default, alias = "appleAppID")]
    pub apple_app_id: Option<String>,

    /// Android package name (required for Android events)
    #[serde(default, alias = "androidAppID")]
    pub android_app_id: Option<String>,
}

impl Settings {
    /// Apple App ID, ignoring blank values
    pub fn apple_app_id(&self) -> Option<&str> {
        self.apple_app_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Android App ID, ignoring blank values
    pub fn android_app_id(&self) -> Option<&str> {
        self.android_app_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Check if a dev key is configured
    pub fn has_dev_key(&self) -> bool {
        !self.dev_key.is_empty()
    }
}

/// HTTP transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// API base URL; the per-app endpoint is appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Delay before the first retry in milliseconds (doubles per attempt)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    500
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/appsflyer-relay/config.toml` (~/.config/appsflyer-relay/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("appsflyer-relay").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/appsflyer-relay/` (~/.local/state/appsflyer-relay/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("appsflyer-relay")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/appsflyer-relay/appsflyer-relay.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("appsflyer-relay.log")
    }
}
