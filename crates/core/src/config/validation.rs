//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `port` is 0
    /// - `user_agent` is empty
    /// - `stale_after_secs` is 0 or longer than a day
    /// - `probe_timeout_ms` is outside 100ms..=60s
    /// - `render_timeout_ms` is outside 1s..=5 minutes
    /// - `onesignal_base_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid { field: "port".into(), reason: "must be greater than 0".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !(1..=86_400).contains(&self.stale_after_secs) {
            return Err(ConfigError::Invalid {
                field: "stale_after_secs".into(),
                reason: "must be between 1 second and 1 day".into(),
            });
        }

        if self.probe_timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "probe_timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.probe_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "probe_timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.render_timeout_ms < 1_000 {
            return Err(ConfigError::Invalid { field: "render_timeout_ms".into(), reason: "must be at least 1s".into() });
        }
        if self.render_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "render_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        match url::Url::parse(&self.onesignal_base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Invalid {
                    field: "onesignal_base_url".into(),
                    reason: format!("not an http(s) URL: {}", self.onesignal_base_url),
                });
            }
        }

        if self.onesignal_app_id.is_some() != self.onesignal_api_key.is_some() {
            tracing::warn!(
                app_id_set = self.onesignal_app_id.is_some(),
                api_key_set = self.onesignal_api_key.is_some(),
                "Only one OneSignal credential is set; push notifications are disabled"
            );
        }

        Ok(())
    }
}
