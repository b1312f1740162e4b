//! Page snapshots via headless browser.
//!
//! This module provides the [`Capturer`] contract and a feature-gated
//! implementation using chromiumoxide for headless Chrome/Chromium control.
//! Capturing never fails from the caller's point of view: every error,
//! timeout included, is logged and reported as "no artifact".

pub mod artifact;

use std::time::Duration;
use thiserror::Error;

use crate::target::Target;

pub use artifact::artifact_name;

/// Errors that can occur while capturing a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to rasterize or write the page image.
    #[error("screenshot failed: {0}")]
    Screenshot(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Snapshot directory could not be prepared.
    #[error("snapshot directory: {0}")]
    Io(String),
}

/// Options for capturing a page.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Deadline for navigation plus screenshot (default: 30s).
    pub timeout: Duration,

    /// Browser window dimensions (default: 1280x720).
    pub viewport: (u32, u32),
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), viewport: (1280, 720) }
    }
}

/// Produces snapshot artifacts.
#[async_trait::async_trait]
pub trait Capturer: Send + Sync {
    /// Capture `target` and return the artifact name, or `None` on any failure.
    async fn capture(&self, target: &Target) -> Option<String>;
}

/// Capturer used when rendering is switched off or unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCapturer;

#[async_trait::async_trait]
impl Capturer for DisabledCapturer {
    async fn capture(&self, target: &Target) -> Option<String> {
        tracing::debug!(url = %target, "rendering disabled; no snapshot captured");
        None
    }
}

#[cfg(feature = "render")]
pub use headless::HeadlessCapturer;

#[cfg(feature = "render")]
mod headless {
    use super::*;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::error::CdpError;
    use chromiumoxide::page::ScreenshotParams;
    use futures_util::StreamExt;
    use std::path::PathBuf;
    use tokio::time::{Instant, timeout_at};

    /// Pump browser events until the connection closes.
    ///
    /// Event errors are logged and skipped; pages stop resolving once this loop exits.
    pub(crate) async fn drive_handler<S>(mut events: S)
    where
        S: futures_util::Stream<Item = Result<(), CdpError>> + Unpin,
    {
        while let Some(event) = events.next().await {
            if let Err(e) = event {
                tracing::debug!(error = %e, "browser handler event error");
            }
        }
        tracing::warn!("browser connection closed; further captures will fail");
    }

    /// Headless Chrome/Chromium capturer using chromiumoxide.
    ///
    /// One browser instance is shared by all captures; each capture uses its own page.
    pub struct HeadlessCapturer {
        browser: Browser,
        output_dir: PathBuf,
        options: CaptureOptions,
    }

    impl HeadlessCapturer {
        /// Launch a headless browser writing snapshots into `output_dir`.
        ///
        /// The browser uses a background task to handle Chrome DevTools
        /// Protocol events.
        pub async fn new(output_dir: impl Into<PathBuf>, options: CaptureOptions) -> Result<Self, RenderError> {
            let output_dir = output_dir.into();
            tokio::fs::create_dir_all(&output_dir)
                .await
                .map_err(|e| RenderError::Io(format!("{}: {e}", output_dir.display())))?;

            let (width, height) = options.viewport;
            let config = BrowserConfig::builder()
                .no_sandbox()
                .arg("--disable-setuid-sandbox")
                .window_size(width, height)
                .build()
                .map_err(RenderError::BrowserLaunch)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

            tokio::spawn(drive_handler(handler));

            Ok(Self { browser, output_dir, options })
        }

        async fn render(&self, target: &Target) -> Result<String, RenderError> {
            let timeout_ms = self.options.timeout.as_millis() as u64;
            let deadline = Instant::now() + self.options.timeout;

            let page = timeout_at(deadline, self.browser.new_page(target.as_str()))
                .await
                .map_err(|_| RenderError::Timeout(timeout_ms))?
                .map_err(|e| RenderError::Navigation(e.to_string()))?;

            let name = artifact_name(target);
            let path = self.output_dir.join(&name);

            let shot = async {
                page.wait_for_navigation()
                    .await
                    .map_err(|e| RenderError::Navigation(e.to_string()))?;
                page.save_screenshot(ScreenshotParams::builder().format(CaptureScreenshotFormat::Png).build(), &path)
                    .await
                    .map_err(|e| RenderError::Screenshot(e.to_string()))?;
                Ok::<(), RenderError>(())
            };

            let result = match timeout_at(deadline, shot).await {
                Ok(inner) => inner,
                Err(_) => Err(RenderError::Timeout(timeout_ms)),
            };

            page.close().await.ok();
            result.map(|()| name)
        }
    }

    #[async_trait::async_trait]
    impl Capturer for HeadlessCapturer {
        async fn capture(&self, target: &Target) -> Option<String> {
            let start = std::time::Instant::now();
            match self.render(target).await {
                Ok(name) => {
                    tracing::info!(
                        url = %target,
                        artifact = %name,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "snapshot captured"
                    );
                    Some(name)
                }
                Err(e) => {
                    tracing::warn!(url = %target, error = %e, "snapshot capture failed");
                    None
                }
            }
        }
    }
}
