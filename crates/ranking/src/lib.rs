use core_types::{RankedEntry, ValidatedEntry};
use std::cmp::Ordering;

pub mod display;

pub use display::{ANONYMOUS_DISPLAY_NAME, display_info, resolve_display_name};

/// Leaderboard order: portfolio value, then pnl percent, then trade count
/// (all descending), then email ascending so that equal records still have a
/// stable, total order.
pub fn compare_entries(a: &ValidatedEntry, b: &ValidatedEntry) -> Ordering {
    b.portfolio_value
        .cmp(&a.portfolio_value)
        .then_with(|| b.pnl_percent.cmp(&a.pnl_percent))
        .then_with(|| b.total_trades.cmp(&a.total_trades))
        .then_with(|| a.email.cmp(&b.email))
}

/// Sorts validated entries and assigns competition ranks.
///
/// Ranks are computed from portfolio value alone: entries with equal value
/// share a rank and the next distinct value skips ahead (`1, 1, 3`). The rank
/// reported by the API is ignored.
pub fn rank_and_sort(entries: Vec<ValidatedEntry>) -> Vec<RankedEntry> {
    let mut entries = entries;
    entries.sort_by(compare_entries);

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(previous) if previous.entry.portfolio_value == entry.portfolio_value => previous.rank,
            _ => position as u64 + 1,
        };
        ranked.push(RankedEntry {
            display_name: resolve_display_name(&entry),
            entry,
            rank,
        });
    }

    tracing::debug!(entries = ranked.len(), "Leaderboard ranked");
    ranked
}

/// Re-ranks an already ranked list, e.g. after entries were added or removed.
/// Ranking a ranked list again yields the same list.
pub fn rerank(ranked: Vec<RankedEntry>) -> Vec<RankedEntry> {
    rank_and_sort(ranked.into_iter().map(|r| r.entry).collect())
}

pub fn find_by_email<'a>(ranked: &'a [RankedEntry], email: &str) -> Option<&'a RankedEntry> {
    ranked.iter().find(|r| r.entry.email == email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn entry(email: &str, value: Decimal) -> ValidatedEntry {
        ValidatedEntry {
            email: email.to_string(),
            username: None,
            name: None,
            portfolio_value: value,
            pnl: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
            total_trades: 0,
            reported_rank: None,
        }
    }

    #[test]
    fn ties_share_a_rank_and_skip_the_next() {
        let ranked = rank_and_sort(vec![
            entry("c@x.com", dec!(90)),
            entry("b@x.com", dec!(100)),
            entry("a@x.com", dec!(100)),
        ]);

        let ranks: Vec<u64> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
        let emails: Vec<&str> = ranked.iter().map(|r| r.entry.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com", "c@x.com"]);
    }

    #[test]
    fn secondary_keys_break_value_ties() {
        let mut better_pct = entry("z@x.com", dec!(100));
        better_pct.pnl_percent = dec!(5);
        let mut more_trades = entry("y@x.com", dec!(100));
        more_trades.total_trades = 10;
        let plain = entry("x@x.com", dec!(100));

        let ranked = rank_and_sort(vec![plain, more_trades, better_pct]);
        let emails: Vec<&str> = ranked.iter().map(|r| r.entry.email.as_str()).collect();
        assert_eq!(emails, vec!["z@x.com", "y@x.com", "x@x.com"]);
        assert!(ranked.iter().all(|r| r.rank == 1));
    }

    #[test]
    fn api_reported_rank_is_ignored() {
        let mut first = entry("a@x.com", dec!(500));
        first.reported_rank = Some(9);
        let mut second = entry("b@x.com", dec!(10));
        second.reported_rank = Some(1);

        let ranked = rank_and_sort(vec![second, first]);
        assert_eq!(ranked[0].entry.email, "a@x.com");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn display_names_follow_the_fallback_chain() {
        let mut with_username = entry("x@example.com", dec!(2));
        with_username.username = Some("a".into());
        let mut with_bob = entry("y@example.com", dec!(1));
        with_bob.username = Some("Bob".into());

        let ranked = rank_and_sort(vec![with_username, with_bob, entry("carol@example.com", dec!(0))]);
        let names: Vec<&str> = ranked.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "Bob", "carol"]);
    }

    #[test]
    fn empty_input_ranks_to_empty_output() {
        assert!(rank_and_sort(Vec::new()).is_empty());
    }

    #[test]
    fn finds_entries_by_email() {
        let ranked = rank_and_sort(vec![entry("a@x.com", dec!(1)), entry("b@x.com", dec!(2))]);
        assert_eq!(find_by_email(&ranked, "a@x.com").map(|r| r.rank), Some(2));
        assert!(find_by_email(&ranked, "A@x.com").is_none());
    }
}
