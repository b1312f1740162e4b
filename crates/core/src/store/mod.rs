//! Persistent per-URL monitoring state.
//!
//! This module provides the [`DomainStore`] contract the check coordinator
//! depends on, and [`DomainDb`], its SQLite implementation:
//!
//! - One row per monitored URL, unique on `url`
//! - `last_update` never moves backwards
//! - Updates cannot clear a stored snapshot
//! - Automatic schema migrations

pub mod connection;
pub mod domains;
pub mod migrations;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::Error;
pub use connection::DomainDb;

/// Placeholder for status text and response rate before a probe has produced one.
pub const UNKNOWN: &str = "unknown";

/// Persisted monitoring state for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: i64,
    pub url: String,
    /// Status text of the last probe, or `"unknown"`.
    pub status: String,
    /// Status code of the last probe, or 0.
    pub ping: i64,
    /// Latency of the last probe in milliseconds (or the server-reported
    /// duration), or `"unknown"` when no response was obtained.
    pub response_rate: String,
    /// Whether the last probe obtained any HTTP response.
    pub reachable: bool,
    /// Artifact name of the most recent successful capture.
    pub snapshot: Option<String>,
    pub last_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a record created on the first check of a URL.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub url: String,
    pub snapshot: Option<String>,
    pub last_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewDomain {
    /// A record with placeholder probe fields, stamped `now`.
    pub fn placeholder(url: impl Into<String>, snapshot: Option<String>, now: DateTime<Utc>) -> Self {
        Self { url: url.into(), snapshot, last_update: now, created_at: now }
    }
}

/// Partial update; `None` fields are left untouched.
///
/// `snapshot` can only be replaced by a new artifact, never cleared.
#[derive(Debug, Clone, Default)]
pub struct DomainUpdate {
    pub status: Option<String>,
    pub ping: Option<i64>,
    pub response_rate: Option<String>,
    pub reachable: Option<bool>,
    pub snapshot: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl DomainUpdate {
    /// Snapshot refresh after a successful capture.
    pub fn snapshot(artifact: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { snapshot: Some(artifact.into()), last_update: Some(now), ..Default::default() }
    }
}

/// Store of domain records.
#[async_trait::async_trait]
pub trait DomainStore: Send + Sync {
    /// Look up the record for `url`.
    async fn find_by_url(&self, url: &str) -> Result<Option<DomainRecord>, Error>;

    /// Insert a new record.
    ///
    /// Fails with [`Error::Conflict`] if `url` already exists.
    async fn create(&self, domain: NewDomain) -> Result<DomainRecord, Error>;

    /// Apply `update` to the record for `url` and return the record after the update.
    ///
    /// Fails with [`Error::NotFound`] if no record exists.
    async fn update_by_url(&self, url: &str, update: DomainUpdate) -> Result<DomainRecord, Error>;
}
