//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITEWATCH_*)
//! 2. TOML config file (if SITEWATCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITEWATCH_*)
/// 2. TOML config file (if SITEWATCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding domain records.
    ///
    /// Set via SITEWATCH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    ///
    /// Set via SITEWATCH_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory captured snapshot images are written to and served from.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// User-Agent string for probe requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Age after which a stored snapshot is refreshed, in seconds.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Liveness probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Headless render timeout in milliseconds.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Whether snapshots are captured with a headless browser.
    ///
    /// Set via SITEWATCH_RENDER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub render_enabled: bool,

    /// OneSignal application id for push notifications.
    ///
    /// Set via SITEWATCH_ONESIGNAL_APP_ID environment variable.
    #[serde(default)]
    pub onesignal_app_id: Option<String>,

    /// OneSignal REST API key.
    ///
    /// Set via SITEWATCH_ONESIGNAL_API_KEY environment variable.
    #[serde(default)]
    pub onesignal_api_key: Option<String>,

    /// OneSignal REST API base URL.
    #[serde(default = "default_onesignal_base_url")]
    pub onesignal_base_url: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sitewatch.sqlite")
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("./cdn")
}

fn default_user_agent() -> String {
    "sitewatch/0.1".into()
}

fn default_stale_after_secs() -> u64 {
    300
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_onesignal_base_url() -> String {
    "https://onesignal.com/api/v1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            snapshot_dir: default_snapshot_dir(),
            user_agent: default_user_agent(),
            stale_after_secs: default_stale_after_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            render_enabled: true,
            onesignal_app_id: None,
            onesignal_api_key: None,
            onesignal_base_url: default_onesignal_base_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SITEWATCH_`
    /// 2. TOML file from `SITEWATCH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITEWATCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SITEWATCH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Socket address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `host` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .host
            .parse()
            .map_err(|_| ConfigError::Invalid { field: "host".into(), reason: format!("not an IP address: {}", self.host) })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// OneSignal app id and API key, both required to send pushes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent credential.
    pub fn onesignal_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let app_id = self.onesignal_app_id.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "onesignal_app_id".into(),
            hint: "Set SITEWATCH_ONESIGNAL_APP_ID environment variable".into(),
        })?;
        let api_key = self.onesignal_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "onesignal_api_key".into(),
            hint: "Set SITEWATCH_ONESIGNAL_API_KEY environment variable".into(),
        })?;
        Ok((app_id, api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./sitewatch.sqlite"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.snapshot_dir, PathBuf::from("./cdn"));
        assert_eq!(config.user_agent, "sitewatch/0.1");
        assert_eq!(config.stale_after(), Duration::from_secs(300));
        assert_eq!(config.probe_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.render_timeout(), Duration::from_millis(30_000));
        assert!(config.render_enabled);
        assert!(config.onesignal_app_id.is_none());
        assert!(config.onesignal_api_key.is_none());
    }

    #[test]
    fn test_listen_addr() {
        let config = AppConfig { host: "127.0.0.1".into(), port: 8080, ..Default::default() };
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");

        let config = AppConfig { host: "localhost".into(), ..Default::default() };
        assert!(matches!(config.listen_addr(), Err(ConfigError::Invalid { field, .. }) if field == "host"));
    }

    #[test]
    fn test_onesignal_credentials_missing() {
        let config = AppConfig { onesignal_app_id: Some("app".into()), ..Default::default() };
        let result = config.onesignal_credentials();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "onesignal_api_key"));
    }

    #[test]
    fn test_onesignal_credentials_present() {
        let config = AppConfig {
            onesignal_app_id: Some("app".into()),
            onesignal_api_key: Some("key".into()),
            ..Default::default()
        };
        assert_eq!(config.onesignal_credentials().unwrap(), ("app", "key"));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SITEWATCH_PORT", "4100");
            jail.set_env("SITEWATCH_RENDER_ENABLED", "false");
            jail.set_env("SITEWATCH_ONESIGNAL_APP_ID", "app-123");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.port, 4100);
            assert!(!config.render_enabled);
            assert_eq!(config.onesignal_app_id.as_deref(), Some("app-123"));
            assert_eq!(config.stale_after_secs, 300);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sitewatch.toml", "port = 5000\nstale_after_secs = 60\n")?;
            jail.set_env("SITEWATCH_CONFIG_FILE", "sitewatch.toml");
            jail.set_env("SITEWATCH_PORT", "5001");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.port, 5001);
            assert_eq!(config.stale_after_secs, 60);
            Ok(())
        });
    }
}
