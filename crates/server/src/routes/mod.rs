//! HTTP surface.
//!
//! - `GET /website-info?url=&userId=` runs a full site check
//! - `GET /status?url=` probes the site without touching the store
//! - `GET /snapshot?url=` captures the page on demand
//! - `GET /cdn/<artifact>` serves captured snapshots

pub mod snapshot;
pub mod status;
pub mod website_info;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use serde::Deserialize;
use sitewatch_client::{Capturer, Prober, Target};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::coordinator::Coordinator;
use crate::error::ApiError;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub prober: Arc<dyn Prober>,
    pub capturer: Arc<dyn Capturer>,
}

/// Query parameters accepted by the routes.
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub url: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl TargetQuery {
    /// The `url` parameter as sent, and its normalized form.
    pub fn target(&self) -> Result<(String, Target), ApiError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingUrl)?;
        let target = Target::parse(raw)?;
        Ok((raw.to_string(), target))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.is_empty())
    }
}

pub fn router(state: AppState, snapshot_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/website-info", get(website_info::handler))
        .route("/status", get(status::handler))
        .route("/snapshot", get(snapshot::handler))
        .nest_service("/cdn", ServeDir::new(snapshot_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
