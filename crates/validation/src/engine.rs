use crate::error::ValidationError;
use crate::rules::{EMAIL_PATTERN, Field, FieldKind, FieldRule, Severity, describe_bounds, leaderboard_rules};
use crate::sanitize::{NumberError, describe, escape_html, parse_decimal, truncate_chars};
use configuration::ValidationSettings;
use core_types::{RawLeaderboardEntry, ValidatedEntry};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::Value;

/// The escaped and normalized values of a record, as far as they could be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedEntry {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub portfolio_value: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub pnl_percent: Option<Decimal>,
    pub total_trades: Option<u64>,
    pub rank: Option<u64>,
}

impl SanitizedEntry {
    fn set_text(&mut self, field: Field, value: String) {
        match field {
            Field::Email => self.email = Some(value),
            Field::Username => self.username = Some(value),
            Field::Name => self.name = Some(value),
            _ => {}
        }
    }

    fn set_number(&mut self, field: Field, value: Decimal) {
        match field {
            Field::PortfolioValue => self.portfolio_value = Some(value),
            Field::Pnl => self.pnl = Some(value),
            Field::PnlPercent => self.pnl_percent = Some(value),
            Field::TotalTrades => self.total_trades = value.to_u64(),
            Field::Rank => self.rank = value.to_u64(),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
    pub sanitized: SanitizedEntry,
}

impl ValidationReport {
    /// The accepted record, or `None` when any error was found.
    pub fn into_entry(self) -> Option<ValidatedEntry> {
        if !self.is_valid {
            return None;
        }
        let s = self.sanitized;
        Some(ValidatedEntry {
            email: s.email?,
            username: s.username,
            name: s.name,
            portfolio_value: s.portfolio_value.unwrap_or_default(),
            pnl: s.pnl.unwrap_or_default(),
            pnl_percent: s.pnl_percent.unwrap_or_default(),
            total_trades: s.total_trades.unwrap_or_default(),
            reported_rank: s.rank,
        })
    }
}

/// A record excluded from a batch, identified by its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEntry {
    pub index: usize,
    pub email: Option<String>,
    pub errors: Vec<ValidationError>,
}

/// Warnings raised for an accepted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWarnings {
    pub index: usize,
    pub warnings: Vec<ValidationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub accepted: Vec<ValidatedEntry>,
    pub rejected: Vec<RejectedEntry>,
    pub warnings: Vec<EntryWarnings>,
}

/// Applies the leaderboard rule table to raw records.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: Vec<FieldRule>,
    settings: ValidationSettings,
}

impl Validator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self {
            rules: leaderboard_rules(&settings),
            settings,
        }
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Validates one record. Never fails; all problems end up in the report.
    pub fn validate(&self, raw: &RawLeaderboardEntry) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut sanitized = SanitizedEntry::default();

        for rule in &self.rules {
            let mut issues = Vec::new();
            self.apply(rule, raw, &mut sanitized, &mut issues);
            match rule.severity {
                Severity::Error => errors.extend(issues),
                Severity::Warning => warnings.extend(issues),
            }
        }

        warnings.extend(self.consistency_warnings(&sanitized));

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            sanitized,
        }
    }

    /// Validates every record, keeping accepted ones in input order and
    /// reporting rejected ones by their original index.
    pub fn validate_batch(&self, records: &[RawLeaderboardEntry]) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, raw) in records.iter().enumerate() {
            let result = self.validate(raw);
            if result.is_valid {
                if !result.warnings.is_empty() {
                    report.warnings.push(EntryWarnings {
                        index,
                        warnings: result.warnings.clone(),
                    });
                }
                if let Some(entry) = result.into_entry() {
                    report.accepted.push(entry);
                }
            } else {
                tracing::debug!(index, errors = result.errors.len(), "Leaderboard record rejected");
                report.rejected.push(RejectedEntry {
                    index,
                    email: result.sanitized.email,
                    errors: result.errors,
                });
            }
        }

        if !report.rejected.is_empty() {
            tracing::warn!(
                accepted = report.accepted.len(),
                rejected = report.rejected.len(),
                "Leaderboard batch contained invalid records"
            );
        }
        report
    }

    fn apply(
        &self,
        rule: &FieldRule,
        raw: &RawLeaderboardEntry,
        sanitized: &mut SanitizedEntry,
        issues: &mut Vec<ValidationError>,
    ) {
        let field = rule.field;
        let value = match rule.field.raw(raw) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        };
        let Some(value) = value else {
            if rule.required {
                issues.push(ValidationError::Missing { field });
            }
            return;
        };

        match &rule.kind {
            FieldKind::Email { max_len } => {
                let Some(text) = value.as_str() else {
                    issues.push(ValidationError::NotText {
                        field,
                        value: describe(value),
                    });
                    return;
                };
                let escaped = escape_html(text.trim());
                let length = escaped.chars().count();
                if length > *max_len {
                    issues.push(ValidationError::TooLong {
                        field,
                        length,
                        max: *max_len,
                    });
                } else if !EMAIL_PATTERN.is_match(&escaped) {
                    issues.push(ValidationError::PatternMismatch {
                        field,
                        value: escaped.clone(),
                    });
                }
                sanitized.set_text(field, escaped);
            }
            FieldKind::Text { max_len, pattern } => {
                let Some(text) = value.as_str() else {
                    issues.push(ValidationError::NotText {
                        field,
                        value: describe(value),
                    });
                    return;
                };
                let mut escaped = escape_html(text.trim());
                let length = escaped.chars().count();
                if length > *max_len {
                    issues.push(ValidationError::TooLong {
                        field,
                        length,
                        max: *max_len,
                    });
                    escaped = truncate_chars(&escaped, *max_len);
                }
                if pattern.is_some_and(|p| !p.is_match(&escaped)) {
                    issues.push(ValidationError::PatternMismatch {
                        field,
                        value: escaped.clone(),
                    });
                }
                sanitized.set_text(field, escaped);
            }
            FieldKind::Number { min, max, integer } => {
                let mut number = match parse_decimal(value) {
                    Ok(number) => number,
                    Err(NumberError::NotNumeric) => {
                        issues.push(ValidationError::NotNumeric {
                            field,
                            value: describe(value),
                        });
                        return;
                    }
                    Err(NumberError::OutOfScale) => {
                        issues.push(ValidationError::OutOfScale {
                            field,
                            value: describe(value),
                        });
                        return;
                    }
                };
                if *integer {
                    number = number.trunc();
                }
                let below = min.is_some_and(|min| number < min);
                let above = max.is_some_and(|max| number > max);
                if below || above {
                    issues.push(ValidationError::OutOfRange {
                        field,
                        value: number,
                        bounds: describe_bounds(*min, *max),
                    });
                    return;
                }
                sanitized.set_number(field, number.normalize());
            }
        }
    }

    /// pnl against portfolio value, and pnlPercent against pnl. Warnings only.
    fn consistency_warnings(&self, entry: &SanitizedEntry) -> Vec<ValidationError> {
        let mut warnings = Vec::new();
        let capital = self.settings.starting_capital;

        // Checked arithmetic: an out-of-scale value skips the check instead of overflowing.
        if let (Some(value), Some(pnl)) = (entry.portfolio_value, entry.pnl) {
            let expected = value.checked_sub(capital);
            let off = expected
                .and_then(|expected| pnl.checked_sub(expected))
                .is_some_and(|gap| gap.abs() > self.settings.pnl_tolerance);
            if let (Some(expected), true) = (expected, off) {
                warnings.push(ValidationError::Inconsistent {
                    field: Field::Pnl,
                    actual: pnl,
                    expected,
                    tolerance: self.settings.pnl_tolerance,
                });
            }
        }

        if let (Some(pnl), Some(percent)) = (entry.pnl, entry.pnl_percent) {
            let expected = pnl
                .checked_div(capital)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(4));
            let off = expected
                .and_then(|expected| percent.checked_sub(expected))
                .is_some_and(|gap| gap.abs() > self.settings.pnl_percent_tolerance);
            if let (Some(expected), true) = (expected, off) {
                warnings.push(ValidationError::Inconsistent {
                    field: Field::PnlPercent,
                    actual: percent,
                    expected,
                    tolerance: self.settings.pnl_percent_tolerance,
                });
            }
        }

        warnings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationSettings::default())
    }
}
