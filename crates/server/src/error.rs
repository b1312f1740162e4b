//! HTTP error responses.
//!
//! Every failure a route can return maps to one status code and one JSON
//! body here, so handlers only decide which variant applies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sitewatch_client::UrlError;
use sitewatch_core::Error;

const CHECK_FAILED: &str = "Failed to process website information.";
const STATUS_FAILED: &str = "Failed to check website status. The website might be down or unreachable.";
const SNAPSHOT_FAILED: &str = "Failed to capture website snapshot.";

/// Errors returned by the HTTP routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No `url` query parameter, or a blank one.
    #[error("URL parameter is required.")]
    MissingUrl,

    /// The `url` parameter could not be normalized.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// The site check failed.
    #[error("site check failed for {url}: {source}")]
    Check { url: String, source: Error },

    /// The status probe obtained no response.
    #[error("status check failed for {url}: {source}")]
    Unreachable { url: String, source: Error },

    /// The on-demand capture produced no artifact.
    #[error("snapshot capture failed for {url}")]
    CaptureFailed { url: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::Check { source, .. } => source
                .upstream_status()
                .and_then(|(status, _)| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Unreachable { .. } | ApiError::CaptureFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = match &self {
            ApiError::MissingUrl | ApiError::InvalidUrl(_) => json!({ "error": self.to_string() }),
            ApiError::Check { url, source } => match source.upstream_status() {
                Some((code, text)) if status.as_u16() == code => {
                    json!({ "url": url, "status": code, "statusText": text })
                }
                _ => json!({ "error": CHECK_FAILED }),
            },
            ApiError::Unreachable { .. } => json!({ "error": STATUS_FAILED }),
            ApiError::CaptureFailed { .. } => json!({ "error": SNAPSHOT_FAILED }),
        };

        (status, Json(body)).into_response()
    }
}
