//! `GET /snapshot`: on-demand capture, nothing stored.

use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;

use super::{AppState, TargetQuery};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SnapshotInfo {
    pub url: String,
    /// Artifact name under the snapshot directory.
    pub snapshot: String,
    /// Path the artifact is served from.
    pub path: String,
}

pub async fn handler(
    State(state): State<AppState>, Query(query): Query<TargetQuery>,
) -> Result<Json<SnapshotInfo>, ApiError> {
    let (url, target) = query.target()?;

    match state.capturer.capture(&target).await {
        Some(snapshot) => {
            let path = format!("/cdn/{snapshot}");
            Ok(Json(SnapshotInfo { url, snapshot, path }))
        }
        None => Err(ApiError::CaptureFailed { url }),
    }
}
