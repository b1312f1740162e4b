//! Site check coordination.
//!
//! One [`Coordinator::handle_check`] call runs these steps in order:
//!
//! 1. read the stored record for the target
//! 2. decide whether its snapshot is stale
//! 3. capture a new snapshot when stale, keeping the old one if capture fails
//! 4. create the record, or write the refreshed snapshot
//! 5. probe the site once
//! 6. merge the probe result into the record
//! 7. notify the user when the site gave no response
//! 8. return the merged record

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sitewatch_client::{Capturer, Notifier, ProbeError, ProbeResponse, Prober, Target};
use sitewatch_core::{DomainRecord, DomainStore, DomainUpdate, Error, NewDomain, UNKNOWN};

/// Heading of the push sent for a down site.
pub const DOWN_HEADING: &str = "Oops! Website is down";

pub fn down_message(url: &str) -> String {
    format!("One of your website is down '{url}'")
}

/// Snapshot refresh policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPolicy {
    /// Minimum age of `last_update` before a snapshot is recaptured.
    pub stale_after: Duration,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self { stale_after: Duration::from_secs(5 * 60) }
    }
}

impl CheckPolicy {
    /// A missing record is always stale.
    pub fn is_stale(&self, record: Option<&DomainRecord>, now: DateTime<Utc>) -> bool {
        let Some(record) = record else {
            return true;
        };
        let window = TimeDelta::from_std(self.stale_after).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(record.last_update) >= window
    }
}

/// Record fields written from one probe attempt.
///
/// Any HTTP response, 2xx or not, counts as reachable. Without a response the
/// probe fields fall back to their placeholders.
pub fn probe_update(outcome: &Result<ProbeResponse, ProbeError>, now: DateTime<Utc>) -> DomainUpdate {
    let answered = match outcome {
        Ok(resp) => Some(resp),
        Err(err) => err.response(),
    };

    match answered {
        Some(resp) => DomainUpdate {
            status: Some(resp.status_text.clone()),
            ping: Some(i64::from(resp.status_code)),
            response_rate: Some(resp.response_rate()),
            reachable: Some(true),
            last_update: Some(now),
            snapshot: None,
        },
        None => DomainUpdate {
            status: Some(UNKNOWN.to_string()),
            ping: Some(0),
            response_rate: Some(UNKNOWN.to_string()),
            reachable: Some(false),
            last_update: Some(now),
            snapshot: None,
        },
    }
}

/// Runs site checks against injected collaborators.
pub struct Coordinator {
    store: Arc<dyn DomainStore>,
    prober: Arc<dyn Prober>,
    capturer: Arc<dyn Capturer>,
    notifier: Arc<dyn Notifier>,
    policy: CheckPolicy,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn DomainStore>, prober: Arc<dyn Prober>, capturer: Arc<dyn Capturer>,
        notifier: Arc<dyn Notifier>, policy: CheckPolicy,
    ) -> Self {
        Self { store, prober, capturer, notifier, policy }
    }

    /// Check `target` and return its updated record.
    ///
    /// Capture and probe failures are absorbed into the record. Store failures
    /// are returned, after a best-effort notification.
    pub async fn handle_check(&self, target: &Target, user_id: Option<&str>) -> Result<DomainRecord, Error> {
        match self.run_check(target, user_id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!(url = %target, error = %e, "site check failed");
                self.alert_down(target, user_id).await;
                Err(e)
            }
        }
    }

    async fn run_check(&self, target: &Target, user_id: Option<&str>) -> Result<DomainRecord, Error> {
        let url = target.as_str();
        let existing = self.store.find_by_url(url).await?;

        self.refresh_snapshot(target, existing.as_ref(), Utc::now()).await?;

        let outcome = self.prober.probe(target).await;
        if let Err(e) = &outcome {
            match e.response() {
                Some(_) => tracing::info!(url, error = %e, "site answered with an error status"),
                None => tracing::warn!(url, error = %e, "site did not respond"),
            }
        }

        let merged = self
            .store
            .update_by_url(url, probe_update(&outcome, Utc::now()))
            .await?;

        if !merged.reachable {
            self.alert_down(target, user_id).await;
        }

        tracing::info!(
            url,
            status = %merged.status,
            ping = merged.ping,
            response_rate = %merged.response_rate,
            reachable = merged.reachable,
            "site checked"
        );

        Ok(merged)
    }

    async fn refresh_snapshot(
        &self, target: &Target, existing: Option<&DomainRecord>, now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let url = target.as_str();

        if !self.policy.is_stale(existing, now) {
            tracing::debug!(url, "snapshot is fresh; reusing");
            return Ok(());
        }

        let artifact = self.capturer.capture(target).await;
        if artifact.is_none() {
            tracing::warn!(url, "snapshot capture failed");
        }

        if existing.is_none() {
            match self.store.create(NewDomain::placeholder(url, artifact.clone(), now)).await {
                Ok(_) => return Ok(()),
                Err(Error::Conflict(_)) => {
                    tracing::warn!(url, "record was created concurrently; updating it instead");
                }
                Err(e) => return Err(e),
            }
        }

        match artifact {
            Some(artifact) => {
                self.store
                    .update_by_url(url, DomainUpdate::snapshot(artifact, now))
                    .await?;
            }
            None => tracing::debug!(url, "no new artifact; stored snapshot left unchanged"),
        }

        Ok(())
    }

    async fn alert_down(&self, target: &Target, user_id: Option<&str>) {
        let delivered = self
            .notifier
            .notify(user_id, DOWN_HEADING, &down_message(target.as_str()))
            .await;
        tracing::debug!(url = %target, delivered, "down notification attempted");
    }
}
