use crate::{Aggregator, DASHBOARD_NAMESPACE, LoadContext, user_tag};
use cache::{EntryOptions, priority};
use chrono::Utc;
use core_types::{DashboardSnapshot, DataOrigin, FetchOutcome, PortfolioView, RankInfo, RankView, SourceKind, SourceSlot};
use events::{DashboardEvent, SnapshotSummary};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

pub(crate) fn source_key(source: SourceKind, user_id: &str) -> String {
    format!("{}:{}", source, user_id)
}

pub(crate) fn snapshot_key(user_id: &str) -> String {
    format!("snapshot:{}", user_id)
}

impl Aggregator {
    /// Loads portfolio, funds, and rank concurrently and assembles a snapshot.
    ///
    /// Waits for all three sources to settle. A failed source is filled from
    /// its stale cache entry when one exists, otherwise from a neutral fallback,
    /// and `has_errors` is set. The finished snapshot is cached at the highest
    /// priority and announced with `SnapshotLoaded`.
    pub async fn load_snapshot(&self, user_id: &str, context: &LoadContext) -> DashboardSnapshot {
        let (portfolio, funds, rank) = tokio::join!(
            self.load_source(
                user_id,
                SourceKind::Portfolio,
                context,
                async {
                    self.api
                        .fetch_portfolio(user_id)
                        .await
                        .map(PortfolioView::from_holdings)
                },
                PortfolioView::default,
            ),
            self.load_source(
                user_id,
                SourceKind::Funds,
                context,
                self.api.fetch_funds(user_id),
                || Decimal::ZERO,
            ),
            self.load_source(
                user_id,
                SourceKind::Rank,
                context,
                async { self.api.fetch_rank(user_id).await.map(RankView::from) },
                || RankView::from(RankInfo::solo()),
            ),
        );

        let has_errors = portfolio.is_failed() || funds.is_failed() || rank.is_failed();
        let snapshot = DashboardSnapshot {
            user_id: user_id.to_string(),
            portfolio,
            funds,
            rank,
            loaded_at: Utc::now(),
            has_errors,
        };

        let options = EntryOptions::new()
            .with_tags([DASHBOARD_NAMESPACE.to_string(), user_tag(user_id)])
            .with_priority(priority::CRITICAL);
        if let Err(e) = self
            .cache
            .set_as(DASHBOARD_NAMESPACE, &snapshot_key(user_id), &snapshot, options)
        {
            tracing::warn!(user_id, error = %e, "Snapshot could not be cached.");
        }

        tracing::info!(user_id, has_errors, "Dashboard snapshot loaded.");
        self.events.publish(DashboardEvent::SnapshotLoaded(SnapshotSummary {
            user_id: snapshot.user_id.clone(),
            loaded_at: snapshot.loaded_at,
            has_errors,
        }));
        snapshot
    }

    /// The last snapshot assembled for `user_id`, if it is still fresh.
    pub fn cached_snapshot(&self, user_id: &str) -> Option<DashboardSnapshot> {
        self.cache.get_as(DASHBOARD_NAMESPACE, &snapshot_key(user_id))
    }

    async fn load_source<T, Fut>(
        &self,
        user_id: &str,
        source: SourceKind,
        context: &LoadContext,
        fetch: Fut,
        fallback: impl FnOnce() -> T,
    ) -> SourceSlot<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = FetchOutcome<T>>,
    {
        let key = source_key(source, user_id);

        if !context.force_refresh {
            if let Some(value) = self.cache.get_as::<T>(DASHBOARD_NAMESPACE, &key) {
                tracing::debug!(user_id, %source, "Served from cache.");
                return SourceSlot {
                    value,
                    origin: DataOrigin::Cache,
                    failure: None,
                };
            }
        }

        let options = EntryOptions::new()
            .with_tags([
                DASHBOARD_NAMESPACE.to_string(),
                user_tag(user_id),
                format!("source:{}", source),
            ])
            .with_priority(priority::NORMAL);
        let result = self
            .cache
            .refresh(DASHBOARD_NAMESPACE, &key, options, || async move {
                fetch.await.into_result()
            })
            .await;

        match result {
            Ok(value) => SourceSlot {
                value,
                origin: DataOrigin::Network,
                failure: None,
            },
            Err(failure) => {
                let (value, origin) = match self.cache.get_stale_as::<T>(DASHBOARD_NAMESPACE, &key) {
                    Some(stale) => (stale, DataOrigin::StaleCache),
                    None => (fallback(), DataOrigin::Fallback),
                };
                tracing::warn!(user_id, %source, kind = %failure.kind, ?origin, "Source failed; using degraded data.");
                self.events.publish(DashboardEvent::SourceFailed {
                    user_id: user_id.to_string(),
                    source,
                    kind: failure.kind,
                    origin,
                });
                SourceSlot {
                    value,
                    origin,
                    failure: Some(failure),
                }
            }
        }
    }
}
