//! sitewatch server entry point.
//!
//! Boots the HTTP API: loads configuration, opens the domain store, wires the
//! probe, capture and push collaborators into the coordinator and serves
//! until Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use sitewatch_client::{
    Capturer, DisabledCapturer, DisabledNotifier, HttpProber, Notifier, OneSignalConfig, OneSignalNotifier, ProbeConfig,
};
use sitewatch_core::{AppConfig, DomainDb};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod coordinator;
mod error;
mod routes;
#[cfg(test)]
mod testing;

use coordinator::{CheckPolicy, Coordinator};
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), snapshot_dir = %config.snapshot_dir.display(), "starting sitewatch");

    let db = DomainDb::open(&config.db_path).await?;
    tokio::fs::create_dir_all(&config.snapshot_dir).await?;

    let prober = Arc::new(HttpProber::new(ProbeConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.probe_timeout(),
        ..Default::default()
    })?);
    let capturer = build_capturer(&config).await;
    let notifier = build_notifier(&config)?;

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(db.clone()),
        prober.clone(),
        capturer.clone(),
        notifier,
        CheckPolicy { stale_after: config.stale_after() },
    ));

    let state = AppState { coordinator, prober, capturer };
    let app = routes::router(state, &config.snapshot_dir);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    db.close().await?;
    tracing::info!("sitewatch stopped");

    Ok(())
}

async fn build_capturer(config: &AppConfig) -> Arc<dyn Capturer> {
    if !config.render_enabled {
        tracing::info!("rendering disabled by configuration; snapshots will not be captured");
        return Arc::new(DisabledCapturer);
    }

    match launch_capturer(config).await {
        Some(capturer) => capturer,
        None => Arc::new(DisabledCapturer),
    }
}

#[cfg(feature = "render")]
async fn launch_capturer(config: &AppConfig) -> Option<Arc<dyn Capturer>> {
    use sitewatch_client::{CaptureOptions, HeadlessCapturer};

    let options = CaptureOptions { timeout: config.render_timeout(), ..Default::default() };
    match HeadlessCapturer::new(config.snapshot_dir.clone(), options).await {
        Ok(capturer) => {
            tracing::info!("headless browser ready");
            Some(Arc::new(capturer))
        }
        Err(e) => {
            tracing::warn!(error = %e, "headless browser unavailable; snapshots will not be captured");
            None
        }
    }
}

#[cfg(not(feature = "render"))]
async fn launch_capturer(_config: &AppConfig) -> Option<Arc<dyn Capturer>> {
    tracing::warn!("built without the render feature; snapshots will not be captured");
    None
}

fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    match config.onesignal_credentials() {
        Ok((app_id, api_key)) => {
            let onesignal =
                OneSignalConfig { base_url: config.onesignal_base_url.clone(), ..OneSignalConfig::new(app_id, api_key) };
            Ok(Arc::new(OneSignalNotifier::new(onesignal)?))
        }
        Err(e) => {
            tracing::warn!(reason = %e, "push notifications disabled");
            Ok(Arc::new(DisabledNotifier))
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
