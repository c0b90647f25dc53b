mod common;

use aggregator::LoadContext;
use common::Harness;
use core_types::{DataOrigin, ErrorKind};
use events::DashboardEvent;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use validation::{Field, ValidationError};

const LEADERBOARD: &str = "/leaderboard";

fn records() -> serde_json::Value {
    json!([
        {"email": "low@example.com", "username": "low", "portfolioValue": 90000, "pnl": -10000, "pnlPercent": -10, "totalTrades": 4, "rank": 3},
        {"email": "bad@example.com", "portfolioValue": "not-a-number", "rank": 2},
        {"email": "tie.b@example.com", "name": "Bob", "portfolioValue": "120000", "pnl": 20000, "pnlPercent": 20, "totalTrades": 8, "rank": 1},
        {"email": "tie.a@example.com", "portfolioValue": 120000, "pnl": 20000, "pnlPercent": 20, "totalTrades": 8, "rank": 1},
        {"email": "<script>@example.com", "portfolioValue": 1, "rank": 9}
    ])
}

#[tokio::test(start_paused = true)]
async fn validates_ranks_and_reports_rejections() {
    let mut harness = Harness::new();
    harness.client.script(LEADERBOARD, vec![Ok(records())]);

    let board = harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;

    assert_eq!(board.origin, DataOrigin::Network);
    assert!(board.failure.is_none());

    let order: Vec<(&str, u64, &str)> = board
        .ranked
        .iter()
        .map(|r| (r.entry.email.as_str(), r.rank, r.display_name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("tie.a@example.com", 1, "tie.a"),
            ("tie.b@example.com", 1, "Bob"),
            ("low@example.com", 3, "low"),
            ("&lt;script&gt;@example.com", 4, "&lt;script&gt;"),
        ]
    );
    assert_eq!(board.ranked[1].entry.portfolio_value, dec!(120000));

    assert_eq!(board.rejected.len(), 1);
    assert_eq!(board.rejected[0].index, 1);
    assert_eq!(
        board.rejected[0].errors,
        vec![ValidationError::NotNumeric {
            field: Field::PortfolioValue,
            value: "not-a-number".into()
        }]
    );

    let events = harness.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        DashboardEvent::LeaderboardRanked(summary) if summary.ranked == 4 && summary.rejected == 1
    )));
}

#[tokio::test(start_paused = true)]
async fn cached_payload_is_revalidated_without_refetching() {
    let harness = Harness::new();
    harness.client.script(LEADERBOARD, vec![Ok(records())]);

    let first = harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;
    let second = harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;

    assert_eq!(harness.client.calls_to(LEADERBOARD), 1);
    assert_eq!(second.origin, DataOrigin::Cache);
    assert_eq!(first.ranked, second.ranked);
    assert_eq!(first.rejected, second.rejected);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_uses_stale_payload_then_empty_board() {
    let harness = Harness::new();
    harness.client.script(LEADERBOARD, vec![Ok(records())]);
    harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;

    harness.client.script(LEADERBOARD, vec![Err(404)]);
    harness.clock.advance(Duration::from_secs(3600));
    let stale = harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;
    assert_eq!(stale.origin, DataOrigin::StaleCache);
    assert_eq!(stale.ranked.len(), 4);
    assert_eq!(stale.failure.map(|f| f.kind), Some(ErrorKind::Client(404)));

    harness.aggregator.purge_expired();
    let empty = harness
        .aggregator
        .load_leaderboard(&LoadContext::default())
        .await;
    assert_eq!(empty.origin, DataOrigin::Fallback);
    assert!(empty.ranked.is_empty());
    assert!(empty.rejected.is_empty());
}
