//! Liveness probe: one HEAD request per check.
//!
//! ### Outcomes
//! - 2xx → [`ProbeResponse`]
//! - any other status → [`ProbeError::Http`] carrying the response
//! - no response at all (DNS, refused, reset, timeout) → [`ProbeError::Network`]
//!   or [`ProbeError::Timeout`]
//!
//! ### Limits
//! - One attempt, no retries
//! - Per-request timeout (default: 10s)
//! - Max redirects: 21

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

use crate::target::Target;

/// Response header a server may use to report its own handling time.
pub const SERVER_DURATION_HEADER: &str = "request-duration";

/// Configuration for the probe client.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// User agent string (default: "sitewatch/0.1")
    pub user_agent: String,

    /// Request timeout (default: 10s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 21)
    pub max_redirects: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { user_agent: "sitewatch/0.1".to_string(), timeout: Duration::from_secs(10), max_redirects: 21 }
    }
}

/// An HTTP response observed by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub status_text: String,
    /// Wall time from sending the request to receiving headers.
    pub elapsed_ms: u64,
    /// Value of the `request-duration` header, if the server sent one.
    pub server_duration: Option<String>,
}

/// A server-reported duration is only trusted when it is a non-negative number.
fn is_duration(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(|d| d.is_finite() && d >= 0.0)
}

impl ProbeResponse {
    /// Latency to record: the server-reported duration when it is numeric, else the measured time.
    pub fn response_rate(&self) -> String {
        self.server_duration
            .as_deref()
            .filter(|d| is_duration(d))
            .map(str::to_string)
            .unwrap_or_else(|| self.elapsed_ms.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Errors from a probe attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    /// The server answered, but not with 2xx.
    #[error("HTTP {} {}", .0.status_code, .0.status_text)]
    Http(ProbeResponse),

    /// No response could be obtained.
    #[error("network error: {0}")]
    Network(String),

    /// No response within the probe timeout.
    #[error("probe timeout after {0}ms")]
    Timeout(u64),
}

impl ProbeError {
    /// The response embedded in the error, if the server answered at all.
    pub fn response(&self) -> Option<&ProbeResponse> {
        match self {
            ProbeError::Http(resp) => Some(resp),
            ProbeError::Network(_) | ProbeError::Timeout(_) => None,
        }
    }
}

impl From<ProbeError> for sitewatch_core::Error {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Http(resp) => {
                sitewatch_core::Error::Upstream { status: resp.status_code, status_text: resp.status_text }
            }
            other => sitewatch_core::Error::Unreachable(other.to_string()),
        }
    }
}

/// Issues liveness probes.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `target` once.
    async fn probe(&self, target: &Target) -> Result<ProbeResponse, ProbeError>;
}

/// reqwest-backed HEAD prober.
#[derive(Debug, Clone)]
pub struct HttpProber {
    http: Client,
    config: ProbeConfig,
}

impl HttpProber {
    /// Create a new prober with the given configuration.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .build()
            .map_err(|e| ProbeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn classify(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            ProbeError::Network(err.to_string())
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> Result<ProbeResponse, ProbeError> {
        let start = Instant::now();

        let response = self
            .http
            .head(target.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let status = response.status();
        let server_duration = response
            .headers()
            .get(SERVER_DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| is_duration(s))
            .map(str::to_string);

        let observed = ProbeResponse {
            status_code: status.as_u16(),
            status_text: status_text(status),
            elapsed_ms,
            server_duration,
        };

        tracing::debug!(url = %target, status = observed.status_code, elapsed_ms, "probe answered");

        if observed.is_success() { Ok(observed) } else { Err(ProbeError::Http(observed)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober() -> HttpProber {
        HttpProber::new(ProbeConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap()
    }

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::default();
        assert_eq!(config.user_agent, "sitewatch/0.1");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 21);
    }

    #[test]
    fn test_response_rate_prefers_server_duration() {
        let mut resp = ProbeResponse {
            status_code: 200,
            status_text: "OK".into(),
            elapsed_ms: 42,
            server_duration: None,
        };
        assert_eq!(resp.response_rate(), "42");

        resp.server_duration = Some("17".into());
        assert_eq!(resp.response_rate(), "17");

        resp.server_duration = Some("12.5".into());
        assert_eq!(resp.response_rate(), "12.5");
    }

    #[test]
    fn test_response_rate_ignores_non_numeric_server_duration() {
        let mut resp = ProbeResponse {
            status_code: 200,
            status_text: "OK".into(),
            elapsed_ms: 42,
            server_duration: Some("unknown".into()),
        };
        assert_eq!(resp.response_rate(), "42");

        for bogus in ["", "-3", "NaN", "inf", "12ms"] {
            resp.server_duration = Some(bogus.into());
            assert_eq!(resp.response_rate(), "42", "{bogus}");
        }
    }

    #[test]
    fn test_http_error_converts_to_upstream() {
        let err = ProbeError::Http(ProbeResponse {
            status_code: 502,
            status_text: "Bad Gateway".into(),
            elapsed_ms: 3,
            server_duration: None,
        });
        let core: sitewatch_core::Error = err.into();
        assert_eq!(core.upstream_status(), Some((502, "Bad Gateway")));

        let core: sitewatch_core::Error = ProbeError::Timeout(500).into();
        assert!(matches!(core, sitewatch_core::Error::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_probe_success() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let target = Target::parse(&server.uri()).unwrap();
        let resp = prober().probe(&target).await.unwrap();

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.status_text, "OK");
        assert!(resp.server_duration.is_none());
    }

    #[tokio::test]
    async fn test_probe_reads_server_duration() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(204).insert_header(SERVER_DURATION_HEADER, "13"))
            .mount(&server)
            .await;

        let target = Target::parse(&server.uri()).unwrap();
        let resp = prober().probe(&target).await.unwrap();

        assert_eq!(resp.status_code, 204);
        assert_eq!(resp.response_rate(), "13");
    }

    #[tokio::test]
    async fn test_probe_follows_long_redirect_chain() {
        let server = MockServer::start().await;
        for hop in 0..8 {
            Mock::given(method("HEAD"))
                .and(path(format!("/hop/{hop}")))
                .respond_with(ResponseTemplate::new(302).insert_header("location", format!("/hop/{}", hop + 1)))
                .mount(&server)
                .await;
        }
        Mock::given(method("HEAD"))
            .and(path("/hop/8"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let target = Target::parse(&format!("{}/hop/0", server.uri())).unwrap();
        let resp = prober().probe(&target).await.unwrap();

        assert_eq!(resp.status_code, 200);
    }

    #[tokio::test]
    async fn test_probe_drops_non_numeric_server_duration() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header(SERVER_DURATION_HEADER, "unknown"))
            .mount(&server)
            .await;

        let target = Target::parse(&server.uri()).unwrap();
        let resp = prober().probe(&target).await.unwrap();

        assert!(resp.server_duration.is_none());
        assert_eq!(resp.response_rate(), resp.elapsed_ms.to_string());
    }

    #[tokio::test]
    async fn test_probe_non_success_embeds_response() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let target = Target::parse(&format!("{}/health", server.uri())).unwrap();
        let err = prober().probe(&target).await.unwrap_err();

        let resp = err.response().expect("503 should carry its response");
        assert_eq!(resp.status_code, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
    }

    #[tokio::test]
    async fn test_probe_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = Target::parse(&format!("http://{addr}/")).unwrap();
        let err = prober().probe(&target).await.unwrap_err();

        assert!(matches!(err, ProbeError::Network(_)));
        assert!(err.response().is_none());
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let target = Target::parse(&server.uri()).unwrap();
        let err = prober().probe(&target).await.unwrap_err();

        assert!(matches!(err, ProbeError::Timeout(500)));
    }
}
