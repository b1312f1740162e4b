//! `GET /status`: one probe, nothing stored.

use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;
use sitewatch_client::{ProbeError, ProbeResponse};

use super::{AppState, TargetQuery};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub url: String,
    pub status: u16,
    pub status_text: String,
}

impl SiteStatus {
    fn new(url: String, resp: &ProbeResponse) -> Self {
        Self { url, status: resp.status_code, status_text: resp.status_text.clone() }
    }
}

/// Any HTTP answer, error statuses included, is reported with 200.
pub async fn handler(
    State(state): State<AppState>, Query(query): Query<TargetQuery>,
) -> Result<Json<SiteStatus>, ApiError> {
    let (url, target) = query.target()?;

    match state.prober.probe(&target).await {
        Ok(resp) | Err(ProbeError::Http(resp)) => Ok(Json(SiteStatus::new(url, &resp))),
        Err(e) => Err(ApiError::Unreachable { url, source: e.into() }),
    }
}
