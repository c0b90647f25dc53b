use configuration::ValidationSettings;
use core_types::RawLeaderboardEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The largest integer a double-precision float represents exactly.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

/// The fields of a leaderboard record that carry rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Email,
    Username,
    Name,
    PortfolioValue,
    Pnl,
    PnlPercent,
    TotalTrades,
    Rank,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Username => "username",
            Field::Name => "name",
            Field::PortfolioValue => "portfolioValue",
            Field::Pnl => "pnl",
            Field::PnlPercent => "pnlPercent",
            Field::TotalTrades => "totalTrades",
            Field::Rank => "rank",
        }
    }

    /// The raw value of this field in `entry`, if the key was present at all.
    pub fn raw<'a>(&self, entry: &'a RawLeaderboardEntry) -> Option<&'a Value> {
        match self {
            Field::Email => entry.email.as_ref(),
            Field::Username => entry.username.as_ref(),
            Field::Name => entry.name.as_ref(),
            Field::PortfolioValue => entry.portfolio_value.as_ref(),
            Field::Pnl => entry.pnl.as_ref(),
            Field::PnlPercent => entry.pnl_percent.as_ref(),
            Field::TotalTrades => entry.total_trades.as_ref(),
            Field::Rank => entry.rank.as_ref(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a violation rejects the record or is only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Escaped text that must look like an address.
    Email { max_len: usize },
    /// Escaped free text. Over-long values are truncated to `max_len`.
    Text {
        max_len: usize,
        pattern: Option<&'static Lazy<Regex>>,
    },
    /// A JSON number or numeric string. `integer` values are truncated toward zero.
    Number {
        min: Option<Decimal>,
        max: Option<Decimal>,
        integer: bool,
    },
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub required: bool,
    pub kind: FieldKind,
    pub severity: Severity,
}

impl FieldRule {
    fn new(field: Field, kind: FieldKind) -> Self {
        Self {
            field,
            required: false,
            kind,
            severity: Severity::Error,
        }
    }

    fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn warn_only(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }
}

/// Human-readable bounds for range diagnostics.
pub(crate) fn describe_bounds(min: Option<Decimal>, max: Option<Decimal>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} to {}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => "any".to_string(),
    }
}

/// The rule table applied to every leaderboard record, in evaluation order.
pub fn leaderboard_rules(settings: &ValidationSettings) -> Vec<FieldRule> {
    vec![
        FieldRule::new(Field::Email, FieldKind::Email { max_len: 254 }).required(true),
        FieldRule::new(
            Field::PortfolioValue,
            FieldKind::Number {
                min: Some(Decimal::ZERO),
                max: Some(Decimal::from(MAX_SAFE_INTEGER)),
                integer: false,
            },
        )
        .required(true),
        FieldRule::new(
            Field::Rank,
            FieldKind::Number {
                min: Some(Decimal::ONE),
                max: Some(Decimal::from(MAX_SAFE_INTEGER)),
                integer: true,
            },
        )
        .required(settings.require_rank),
        FieldRule::new(
            Field::Username,
            FieldKind::Text {
                max_len: 50,
                pattern: Some(&USERNAME_PATTERN),
            },
        )
        .warn_only(),
        FieldRule::new(
            Field::Name,
            FieldKind::Text {
                max_len: 100,
                pattern: None,
            },
        )
        .warn_only(),
        FieldRule::new(
            Field::Pnl,
            FieldKind::Number {
                min: None,
                max: None,
                integer: false,
            },
        ),
        FieldRule::new(
            Field::PnlPercent,
            FieldKind::Number {
                min: Some(Decimal::from(-100)),
                max: None,
                integer: false,
            },
        ),
        FieldRule::new(
            Field::TotalTrades,
            FieldKind::Number {
                min: Some(Decimal::ZERO),
                max: Some(Decimal::from(MAX_SAFE_INTEGER)),
                integer: true,
            },
        ),
    ]
}
