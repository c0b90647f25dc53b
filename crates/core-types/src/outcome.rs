use crate::enums::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a logical fetch ended without a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub retryable: bool,
    pub message: String,
}

impl FetchFailure {
    /// Builds a failure whose `retryable` flag follows the kind's retry policy.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            retryable: kind.is_retryable(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchFailure {}

/// The settled result of one logical fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data")]
pub enum FetchOutcome<T> {
    Success(T),
    Failure(FetchFailure),
}

impl<T> FetchOutcome<T> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        FetchOutcome::Failure(FetchFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// The error kind, if this outcome is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Success(value) => FetchOutcome::Success(f(value)),
            FetchOutcome::Failure(failure) => FetchOutcome::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, FetchFailure> {
        match self {
            FetchOutcome::Success(value) => Ok(value),
            FetchOutcome::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, FetchFailure>> for FetchOutcome<T> {
    fn from(result: Result<T, FetchFailure>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Success(value),
            Err(failure) => FetchOutcome::Failure(failure),
        }
    }
}
