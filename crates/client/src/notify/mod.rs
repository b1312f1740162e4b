//! Push notifications for down sites.
//!
//! ### OneSignal
//!
//! - **Endpoint**: `POST {base_url}/notifications`
//! - **Authentication**: `Authorization: Basic <REST API key>`
//! - **Targeting**: `include_external_user_ids` with the requesting user's id
//!
//! Delivery is best-effort: a missing user id or message, a transport
//! error or a non-2xx answer all yield `false` and a log line, never an error.

use reqwest::header;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default base URL for the OneSignal REST API.
pub const DEFAULT_BASE_URL: &str = "https://onesignal.com/api/v1";

/// Heading used when the caller passes an empty one.
const FALLBACK_HEADING: &str = "Notification";

/// Delivers alerts to a user.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send `message` to `user_id`. Returns whether delivery was accepted.
    async fn notify(&self, user_id: Option<&str>, heading: &str, message: &str) -> bool;
}

/// Notifier used when push credentials are not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, user_id: Option<&str>, heading: &str, _message: &str) -> bool {
        tracing::debug!(user_id = user_id.unwrap_or_default(), heading, "push notifications disabled");
        false
    }
}

/// OneSignal client configuration.
#[derive(Debug, Clone)]
pub struct OneSignalConfig {
    pub app_id: String,
    pub api_key: String,
    /// Base URL (default: https://onesignal.com/api/v1).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
}

impl OneSignalConfig {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    app_id: &'a str,
    include_external_user_ids: [&'a str; 1],
    headings: HashMap<&'static str, &'a str>,
    contents: HashMap<&'static str, &'a str>,
}

/// OneSignal push notifier.
#[derive(Debug, Clone)]
pub struct OneSignalNotifier {
    http: reqwest::Client,
    config: OneSignalConfig,
}

impl OneSignalNotifier {
    /// Create a new notifier with the given configuration.
    pub fn new(config: OneSignalConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn deliver(&self, payload: &PushPayload<'_>) -> Result<(), String> {
        let url = format!("{}/notifications", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, format!("Basic {}", self.config.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("OneSignal returned {status}: {body}"));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for OneSignalNotifier {
    async fn notify(&self, user_id: Option<&str>, heading: &str, message: &str) -> bool {
        let Some(user_id) = user_id.filter(|u| !u.is_empty()) else {
            tracing::debug!(heading, "no user id; notification skipped");
            return false;
        };
        if message.is_empty() {
            tracing::debug!(user_id, heading, "empty message; notification skipped");
            return false;
        }

        let heading = if heading.is_empty() { FALLBACK_HEADING } else { heading };
        let payload = PushPayload {
            app_id: &self.config.app_id,
            include_external_user_ids: [user_id],
            headings: HashMap::from([("en", heading)]),
            contents: HashMap::from([("en", message)]),
        };

        match self.deliver(&payload).await {
            Ok(()) => {
                tracing::info!(user_id, heading, "notification sent");
                true
            }
            Err(e) => {
                tracing::warn!(user_id, heading, error = %e, "failed to send notification");
                false
            }
        }
    }
}
