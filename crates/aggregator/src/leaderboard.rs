use crate::{Aggregator, LEADERBOARD_NAMESPACE, LoadContext};
use cache::{EntryOptions, priority};
use chrono::{DateTime, Utc};
use core_types::{DataOrigin, FetchFailure, RankedEntry, RawLeaderboardEntry};
use events::{DashboardEvent, LeaderboardSummary};
use serde::Serialize;
use validation::{EntryWarnings, RejectedEntry};

const ENTRIES_KEY: &str = "entries";

/// A validated, ranked leaderboard plus everything that was filtered out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    pub ranked: Vec<RankedEntry>,
    /// Records that failed validation, by their index in the raw payload.
    pub rejected: Vec<RejectedEntry>,
    pub warnings: Vec<EntryWarnings>,
    pub origin: DataOrigin,
    pub failure: Option<FetchFailure>,
    pub loaded_at: DateTime<Utc>,
}

impl Aggregator {
    /// Fetches the raw leaderboard (cache first), validates every record, and
    /// ranks the accepted ones. A failed fetch falls back to the stale cached
    /// payload, or to an empty board.
    pub async fn load_leaderboard(&self, context: &LoadContext) -> LeaderboardView {
        let (records, origin, failure) = self.leaderboard_records(context).await;

        let batch = self.validator.validate_batch(&records);
        let ranked = ranking::rank_and_sort(batch.accepted);

        tracing::info!(
            ranked = ranked.len(),
            rejected = batch.rejected.len(),
            ?origin,
            "Leaderboard ranked."
        );
        self.events
            .publish(DashboardEvent::LeaderboardRanked(LeaderboardSummary {
                ranked: ranked.len(),
                rejected: batch.rejected.len(),
                origin,
            }));

        LeaderboardView {
            ranked,
            rejected: batch.rejected,
            warnings: batch.warnings,
            origin,
            failure,
            loaded_at: Utc::now(),
        }
    }

    async fn leaderboard_records(
        &self,
        context: &LoadContext,
    ) -> (Vec<RawLeaderboardEntry>, DataOrigin, Option<FetchFailure>) {
        if !context.force_refresh {
            if let Some(records) = self
                .cache
                .get_as::<Vec<RawLeaderboardEntry>>(LEADERBOARD_NAMESPACE, ENTRIES_KEY)
            {
                return (records, DataOrigin::Cache, None);
            }
        }

        let options = EntryOptions::new()
            .with_tag(LEADERBOARD_NAMESPACE)
            .with_priority(priority::HIGH);
        let result = self
            .cache
            .refresh(LEADERBOARD_NAMESPACE, ENTRIES_KEY, options, || async {
                self.api.fetch_leaderboard().await.into_result()
            })
            .await;

        match result {
            Ok(records) => (records, DataOrigin::Network, None),
            Err(failure) => {
                tracing::warn!(kind = %failure.kind, "Leaderboard fetch failed.");
                match self
                    .cache
                    .get_stale_as::<Vec<RawLeaderboardEntry>>(LEADERBOARD_NAMESPACE, ENTRIES_KEY)
                {
                    Some(records) => (records, DataOrigin::StaleCache, Some(failure)),
                    None => (Vec::new(), DataOrigin::Fallback, Some(failure)),
                }
            }
        }
    }
}
