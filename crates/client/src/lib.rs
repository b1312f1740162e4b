//! Client code for sitewatch.
//!
//! This crate provides the outbound collaborators of a site check: the
//! liveness probe, the headless snapshot capturer and the push notifier,
//! plus the URL normalization they share.

pub mod capture;
pub mod notify;
pub mod probe;
pub mod target;

pub use capture::{CaptureOptions, Capturer, DisabledCapturer, RenderError, artifact_name};
#[cfg(feature = "render")]
pub use capture::HeadlessCapturer;
pub use notify::{DisabledNotifier, Notifier, OneSignalConfig, OneSignalNotifier};
pub use probe::{HttpProber, ProbeConfig, ProbeError, ProbeResponse, Prober};
pub use target::{Target, UrlError};
