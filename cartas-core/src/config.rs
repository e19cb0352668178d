//! Application configuration management.
//!
//! Holds the backend API location, client storage settings, logging, and
//! generation/checkout defaults. Configuration is persisted as TOML on disk;
//! every field has a serde default so partial files load cleanly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants;
use crate::error::{CtError, CtResult};
use crate::platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Client storage (local/session key-value store).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generation defaults and guest throttling.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Reminder notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Checkout redirect settings.
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g. "https://api.cartas.app").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for regular (non-streaming) requests in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

/// Client storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite storage file. If empty, uses the default location.
    #[serde(default)]
    pub path: String,

    /// Minutes of inactivity after which session-scoped keys are discarded.
    #[serde(default = "default_session_idle")]
    pub session_idle_minutes: u64,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter expression.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses the default location.
    #[serde(default)]
    pub directory: String,

    /// Write JSON lines to the log file.
    #[serde(default)]
    pub json_output: bool,
}

/// Generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// ISO country code used for regional phrasing when the user has none.
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Default message format id.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Window in which a repeated guest request counts as a rapid click.
    #[serde(default = "default_rapid_click_window")]
    pub rapid_click_window_ms: u64,

    /// Delay applied once to a rapid guest request.
    #[serde(default = "default_anonymous_delay")]
    pub anonymous_delay_ms: u64,
}

/// Reminder notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Show native desktop notifications for due reminders.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Checkout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Gateway used when neither the caller nor the country picks one
    /// ("stripe" or "mercadopago").
    #[serde(default = "default_gateway")]
    pub default_gateway: String,

    /// Redirect target after a successful payment.
    #[serde(default = "default_success_url")]
    pub success_url: String,

    /// Redirect target after a cancelled payment.
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

// Default value functions for serde

fn default_base_url() -> String {
    constants::DEFAULT_API_BASE_URL.to_string()
}

fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_session_idle() -> u64 {
    30
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_country() -> String {
    "MX".to_string()
}

fn default_format() -> String {
    "mensaje".to_string()
}

fn default_rapid_click_window() -> u64 {
    constants::DEFAULT_RAPID_CLICK_WINDOW_MS
}

fn default_anonymous_delay() -> u64 {
    constants::DEFAULT_ANONYMOUS_DELAY_MS
}

fn default_gateway() -> String {
    "stripe".to_string()
}

fn default_success_url() -> String {
    "https://cartas.app/pago/exito".to_string()
}

fn default_cancel_url() -> String {
    "https://cartas.app/pago/cancelado".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_timeout_ms: default_api_timeout(),
            custom_headers: HashMap::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            session_idle_minutes: default_session_idle(),
            wal_mode: true,
            pool_size: default_pool_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_country: default_country(),
            default_format: default_format(),
            rapid_click_window_ms: default_rapid_click_window(),
            anonymous_delay_ms: default_anonymous_delay(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            default_gateway: default_gateway(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if given, else from the default location, else defaults.
    pub fn load(path: Option<&Path>) -> CtResult<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> CtResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.api.base_url = Self::sanitize_base_url(&config.api.base_url);
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> CtResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CtError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration file path.
    pub fn default_config_path() -> CtResult<PathBuf> {
        Ok(platform::config_dir()?.join("config.toml"))
    }

    /// Effective storage path: configured path or `<data_dir>/cartas.db`.
    pub fn effective_storage_path(&self) -> CtResult<PathBuf> {
        if self.storage.path.is_empty() {
            Ok(platform::data_dir()?.join("cartas.db"))
        } else {
            Ok(PathBuf::from(&self.storage.path))
        }
    }

    /// Effective log directory: configured path or `<data_dir>/logs`.
    pub fn effective_log_dir(&self) -> CtResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Normalize an API base URL: trim quotes and whitespace, add a scheme
    /// (https unless the host is local), drop trailing slashes and a trailing
    /// `/api` segment since endpoint paths already carry it.
    pub fn sanitize_base_url(address: &str) -> String {
        let trimmed = address.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
            format!("http://{trimmed}")
        } else {
            format!("https://{trimmed}")
        };

        let without_slash = with_scheme.trim_end_matches('/');
        without_slash
            .strip_suffix("/api")
            .unwrap_or(without_slash)
            .to_string()
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.api_timeout_ms, 30_000);
        assert_eq!(config.api.base_url, constants::DEFAULT_API_BASE_URL);
        assert_eq!(config.storage.session_idle_minutes, 30);
        assert_eq!(config.generation.anonymous_delay_ms, 1_000);
        assert_eq!(config.checkout.default_gateway, "stripe");
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            AppConfig::sanitize_base_url("api.cartas.app/"),
            "https://api.cartas.app"
        );
        assert_eq!(
            AppConfig::sanitize_base_url("localhost:3001/api"),
            "http://localhost:3001"
        );
        assert_eq!(
            AppConfig::sanitize_base_url("  \"https://example.com/api/\"  "),
            "https://example.com"
        );
        assert_eq!(AppConfig::sanitize_base_url("   "), "");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[generation]\ndefault_country = \"CO\"\n").unwrap();
        assert_eq!(config.generation.default_country, "CO");
        assert_eq!(config.generation.rapid_click_window_ms, 2_000);
        assert_eq!(config.api.api_timeout_ms, 30_000);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.api.base_url = "https://staging.cartas.app/api".into();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.api.base_url, "https://staging.cartas.app");
    }
}
