//! `GET /website-info`: full site check.

use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;
use sitewatch_core::DomainRecord;

use super::{AppState, TargetQuery};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct WebsiteInfo {
    /// The `url` parameter as sent.
    pub url: String,
    pub data: DomainRecord,
}

pub async fn handler(
    State(state): State<AppState>, Query(query): Query<TargetQuery>,
) -> Result<Json<WebsiteInfo>, ApiError> {
    let (url, target) = query.target()?;

    let data = state
        .coordinator
        .handle_check(&target, query.user_id())
        .await
        .map_err(|source| ApiError::Check { url: url.clone(), source })?;

    Ok(Json(WebsiteInfo { url, data }))
}
