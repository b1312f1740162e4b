//! Scripted collaborators for coordinator and route tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sitewatch_client::{Capturer, Notifier, ProbeError, ProbeResponse, Prober, Target};
use sitewatch_core::{DomainDb, DomainRecord, DomainStore, DomainUpdate, Error, NewDomain};

pub fn ok(status_code: u16, status_text: &str, elapsed_ms: u64) -> ProbeResponse {
    ProbeResponse { status_code, status_text: status_text.to_string(), elapsed_ms, server_duration: None }
}

pub fn http_error(status_code: u16, status_text: &str, elapsed_ms: u64) -> ProbeError {
    ProbeError::Http(ok(status_code, status_text, elapsed_ms))
}

pub fn network_error() -> ProbeError {
    ProbeError::Network("connection refused".to_string())
}

/// Replays queued outcomes; answers `200 OK` once the queue is empty.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<VecDeque<Result<ProbeResponse, ProbeError>>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn push(&self, outcome: Result<ProbeResponse, ProbeError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _target: &Target) -> Result<ProbeResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ok(200, "OK", 10)))
    }
}

/// Replays queued artifacts; yields `None` once the queue is empty.
#[derive(Default)]
pub struct ScriptedCapturer {
    outcomes: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedCapturer {
    pub fn push(&self, artifact: Option<&str>) {
        self.outcomes.lock().unwrap().push_back(artifact.map(str::to_string));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Capturer for ScriptedCapturer {
    async fn capture(&self, _target: &Target) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAlert {
    pub user_id: Option<String>,
    pub heading: String,
    pub message: String,
}

/// Records every notification attempt.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentAlert>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: Option<&str>, heading: &str, message: &str) -> bool {
        self.sent.lock().unwrap().push(SentAlert {
            user_id: user_id.map(str::to_string),
            heading: heading.to_string(),
            message: message.to_string(),
        });
        user_id.is_some()
    }
}

/// Hides the stored record from the first lookup, as if another check
/// created it between this check's read and its insert.
pub struct RacingStore {
    inner: DomainDb,
    hidden: AtomicBool,
}

impl RacingStore {
    pub fn new(inner: DomainDb) -> Self {
        Self { inner, hidden: AtomicBool::new(false) }
    }
}

#[async_trait::async_trait]
impl DomainStore for RacingStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<DomainRecord>, Error> {
        if !self.hidden.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_url(url).await
    }

    async fn create(&self, domain: NewDomain) -> Result<DomainRecord, Error> {
        self.inner.create(domain).await
    }

    async fn update_by_url(&self, url: &str, update: DomainUpdate) -> Result<DomainRecord, Error> {
        self.inner.update_by_url(url, update).await
    }
}

/// Fails every operation with a fresh error from `make`.
pub struct FailingStore {
    make: fn() -> Error,
}

impl FailingStore {
    pub fn new(make: fn() -> Error) -> Self {
        Self { make }
    }
}

#[async_trait::async_trait]
impl DomainStore for FailingStore {
    async fn find_by_url(&self, _url: &str) -> Result<Option<DomainRecord>, Error> {
        Err((self.make)())
    }

    async fn create(&self, _domain: NewDomain) -> Result<DomainRecord, Error> {
        Err((self.make)())
    }

    async fn update_by_url(&self, _url: &str, _update: DomainUpdate) -> Result<DomainRecord, Error> {
        Err((self.make)())
    }
}
