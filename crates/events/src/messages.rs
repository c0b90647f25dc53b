use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::{DataOrigin, ErrorKind, SourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A summary of a freshly assembled dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub user_id: String,
    pub loaded_at: DateTime<Utc>,
    pub has_errors: bool,
}

/// The orchestrator decided to retry a request after `delay_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryScheduled {
    pub request_id: Uuid,
    pub url: String,
    /// 1-based number of the retry about to happen.
    pub attempt: u32,
    pub delay_ms: u64,
    pub kind: ErrorKind,
}

/// A summary of one leaderboard ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSummary {
    pub ranked: usize,
    pub rejected: usize,
    pub origin: DataOrigin,
}

/// Every notification the data core publishes.
///
/// The `#[serde(tag = "type", content = "payload")]` attribute serializes the enum
/// into a flat JSON object the UI layer can switch on. For example, a
/// `CacheInvalidated` event looks like:
/// `{
///   "type": "CacheInvalidated",
///   "payload": { "namespace": "dashboard", "removed": 3 }
/// }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardEvent {
    /// A new snapshot superseded the previous one.
    SnapshotLoaded(SnapshotSummary),
    /// A source failed and was replaced by stale or fallback data.
    SourceFailed {
        user_id: String,
        source: SourceKind,
        kind: ErrorKind,
        origin: DataOrigin,
    },
    /// A retryable failure is being retried.
    RetryScheduled(RetryScheduled),
    /// A request was rejected by admission control.
    RequestRejected { request_id: Uuid, url: String },
    /// Entries were removed from the cache on request.
    CacheInvalidated { namespace: String, removed: usize },
    /// The leaderboard was validated and ranked.
    LeaderboardRanked(LeaderboardSummary),
}

impl DashboardEvent {
    /// Serializes the event into the `{type, payload}` JSON form.
    pub fn to_json(&self) -> Result<String, EventsError> {
        serde_json::to_string(self).map_err(|e| EventsError::Serialization(e.to_string()))
    }

    /// A short, stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::SnapshotLoaded(_) => "SnapshotLoaded",
            DashboardEvent::SourceFailed { .. } => "SourceFailed",
            DashboardEvent::RetryScheduled(_) => "RetryScheduled",
            DashboardEvent::RequestRejected { .. } => "RequestRejected",
            DashboardEvent::CacheInvalidated { .. } => "CacheInvalidated",
            DashboardEvent::LeaderboardRanked(_) => "LeaderboardRanked",
        }
    }
}
