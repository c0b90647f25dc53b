use crate::enums::DataOrigin;
use crate::error::CoreError;
use crate::outcome::FetchFailure;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

// Using `#[serde(rename_all = "camelCase")]` to map the API's camelCase JSON onto snake_case fields.

/// A single position as reported by the portfolio endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    #[serde(default)]
    pub quantity: Decimal,
    pub invested_value: Decimal,
    pub current_value: Decimal,
}

/// A holding plus its derived profit/loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    #[serde(flatten)]
    pub holding: Holding,
    pub profit_loss: Decimal,
}

/// The portfolio section of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub holdings: Vec<HoldingView>,
    pub total_invested: Decimal,
    pub total_current: Decimal,
    pub total_profit_loss: Decimal,
}

impl PortfolioView {
    /// Derives `profit_loss = current_value - invested_value` per holding and the totals.
    pub fn from_holdings(holdings: Vec<Holding>) -> Self {
        let mut view = PortfolioView::default();
        for holding in holdings {
            let profit_loss = holding.current_value - holding.invested_value;
            view.total_invested += holding.invested_value;
            view.total_current += holding.current_value;
            view.total_profit_loss += profit_loss;
            view.holdings.push(HoldingView { holding, profit_loss });
        }
        view
    }
}

/// A user's position on the leaderboard, as parsed from the `"rank / total"` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub rank: u64,
    pub total: u64,
}

impl RankInfo {
    /// The neutral "1 of 1" value shown when the rank source is unavailable.
    pub fn solo() -> Self {
        Self { rank: 1, total: 1 }
    }

    /// `round(((total - rank) / (total - 1)) * 100)`, defined as 100 when `total <= 1`.
    pub fn percentile(&self) -> u32 {
        if self.total <= 1 {
            return 100;
        }
        let above = self.total.saturating_sub(self.rank) as f64;
        let span = (self.total - 1) as f64;
        ((above / span) * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

impl FromStr for RankInfo {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput("rank".to_string(), s.to_string());
        let (rank, total) = s.split_once('/').ok_or_else(invalid)?;
        let rank: u64 = rank.trim().parse().map_err(|_| invalid())?;
        let total: u64 = total.trim().parse().map_err(|_| invalid())?;
        if rank == 0 || total == 0 || rank > total {
            return Err(invalid());
        }
        Ok(Self { rank, total })
    }
}

/// The rank section of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankView {
    pub rank: u64,
    pub total: u64,
    pub percentile: u32,
}

impl From<RankInfo> for RankView {
    fn from(info: RankInfo) -> Self {
        Self {
            rank: info.rank,
            total: info.total,
            percentile: info.percentile(),
        }
    }
}

/// One source of the snapshot: always a renderable value, plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSlot<T> {
    pub value: T,
    pub origin: DataOrigin,
    /// Set whenever the fetch for this source failed during the load.
    pub failure: Option<FetchFailure>,
}

impl<T> SourceSlot<T> {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Everything the dashboard needs from one aggregation call.
///
/// Built once by the aggregator and never mutated afterwards; the next load
/// produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub user_id: String,
    pub portfolio: SourceSlot<PortfolioView>,
    pub funds: SourceSlot<Decimal>,
    pub rank: SourceSlot<RankView>,
    pub loaded_at: DateTime<Utc>,
    pub has_errors: bool,
}

/// An untrusted leaderboard record straight from the API. Any field may be
/// missing or carry any JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLeaderboardEntry {
    pub email: Option<Value>,
    pub username: Option<Value>,
    pub name: Option<Value>,
    pub portfolio_value: Option<Value>,
    pub pnl: Option<Value>,
    pub pnl_percent: Option<Value>,
    pub total_trades: Option<Value>,
    pub rank: Option<Value>,
}

/// A leaderboard record that passed validation: sanitized, with defaults filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedEntry {
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub portfolio_value: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub total_trades: u64,
    /// The rank the API reported, kept for diagnostics only.
    pub reported_rank: Option<u64>,
}

/// A validated entry with its computed place on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    #[serde(flatten)]
    pub entry: ValidatedEntry,
    pub display_name: String,
    pub rank: u64,
}

/// The per-user projection consumed by avatar and name widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    pub display_name: String,
    pub email: String,
    pub username: Option<String>,
    pub avatar_initial: String,
}
