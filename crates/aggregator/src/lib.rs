//! Assembles dashboard snapshots and the ranked leaderboard.
//!
//! The aggregator sits on top of the request orchestrator, the cache, and the
//! validation and ranking engines. It never fails a load as a whole: every
//! source degrades to stale or fallback data on its own.

use crate::error::AggregatorError;
use api_client::{DashboardApi, HttpApiClient, RequestOrchestrator};
use cache::{CacheStats, CacheStore, Invalidation};
use configuration::Settings;
use events::{DashboardEvent, EventBus};
use std::sync::Arc;
use validation::Validator;

pub mod error;
pub mod leaderboard;
pub mod snapshot;

pub use leaderboard::LeaderboardView;

pub const DASHBOARD_NAMESPACE: &str = "dashboard";
pub const LEADERBOARD_NAMESPACE: &str = "leaderboard";

/// Per-call options for a load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadContext {
    /// Skip fresh cache entries and always go to the network.
    pub force_refresh: bool,
}

impl LoadContext {
    pub fn refresh() -> Self {
        Self { force_refresh: true }
    }
}

pub(crate) fn user_tag(user_id: &str) -> String {
    format!("user:{}", user_id)
}

pub struct Aggregator {
    api: DashboardApi,
    cache: Arc<CacheStore>,
    validator: Validator,
    events: EventBus,
}

impl Aggregator {
    pub fn new(api: DashboardApi, cache: Arc<CacheStore>, validator: Validator, events: EventBus) -> Self {
        Self {
            api,
            cache,
            validator,
            events,
        }
    }

    /// Wires the HTTP client, orchestrator, cache, and validator from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, AggregatorError> {
        settings.validate()?;

        let events = EventBus::default();
        let client = Arc::new(HttpApiClient::new(&settings.client)?);
        let orchestrator =
            Arc::new(RequestOrchestrator::new(&settings.client).with_events(events.clone()));
        let api = DashboardApi::new(client, orchestrator, settings.client.clone());
        let cache = Arc::new(CacheStore::new(settings.cache.clone()));

        tracing::info!(
            base_url = %settings.client.base_url,
            concurrency_limit = settings.client.concurrency_limit,
            "Aggregator initialized."
        );
        Ok(Self::new(api, cache, Validator::new(settings.validation.clone()), events))
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Drops every cached source value and snapshot for `user_id`.
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        let removed = self
            .cache
            .invalidate(DASHBOARD_NAMESPACE, &Invalidation::tags([user_tag(user_id)]));
        tracing::info!(user_id, removed, "Invalidated cached dashboard data.");
        self.events.publish(DashboardEvent::CacheInvalidated {
            namespace: DASHBOARD_NAMESPACE.to_string(),
            removed,
        });
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops expired cache entries in every namespace.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    /// Cancels every request currently in flight.
    pub fn abort_all(&self) {
        self.api.orchestrator().abort_all();
    }
}
