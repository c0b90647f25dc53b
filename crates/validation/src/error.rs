use crate::rules::Field;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A single problem found in a leaderboard record.
///
/// The same type is used for errors (the record is rejected) and warnings
/// (the record is kept, possibly with a cleaned-up value); which list an issue
/// lands in is decided by the rule that produced it. Every embedded value has
/// already been HTML-escaped.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: Field },

    #[error("{field} must be a number, got {value}")]
    NotNumeric { field: Field, value: String },

    #[error("{field} = {value} is out of range (too large to represent)")]
    OutOfScale { field: Field, value: String },

    #[error("{field} must be text, got {value}")]
    NotText { field: Field, value: String },

    #[error("{field} = {value} is out of range ({bounds})")]
    OutOfRange {
        field: Field,
        value: Decimal,
        bounds: String,
    },

    #[error("{field} '{value}' does not match the expected format")]
    PatternMismatch { field: Field, value: String },

    #[error("{field} is {length} characters long (max {max})")]
    TooLong {
        field: Field,
        length: usize,
        max: usize,
    },

    #[error("{field} = {actual} differs from the expected {expected} by more than {tolerance}")]
    Inconsistent {
        field: Field,
        actual: Decimal,
        expected: Decimal,
        tolerance: Decimal,
    },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NotNumeric { field, .. }
            | ValidationError::OutOfScale { field, .. }
            | ValidationError::NotText { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::PatternMismatch { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::Inconsistent { field, .. } => *field,
        }
    }
}
