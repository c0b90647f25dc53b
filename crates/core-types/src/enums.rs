use serde::{Deserialize, Serialize};
use std::fmt;

/// The failure taxonomy shared by every layer of the data core.
///
/// A cache miss is deliberately absent: it is a control signal, modelled as
/// `Option::None` by the cache, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status")]
pub enum ErrorKind {
    /// The attempt's timer fired before the network call resolved.
    Timeout,
    /// The request never produced an HTTP response (DNS, connection reset, ...).
    Network,
    /// The server answered with a 4xx status.
    Client(u16),
    /// The server answered with a 5xx (or otherwise unexpected) status.
    Server(u16),
    /// Rejected by admission control before any network call was made.
    Overloaded,
    /// The payload could not be interpreted.
    Validation,
    /// Cancelled from outside (e.g. `abort_all`).
    Cancelled,
}

impl ErrorKind {
    /// Maps a non-success HTTP status code onto the taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => ErrorKind::Client(status),
            _ => ErrorKind::Server(status),
        }
    }

    /// Whether the request orchestrator may retry a failure of this kind.
    ///
    /// Client errors are final, except 408 which is always retried. A payload
    /// that could not be decoded (`Validation`) is final too, since a retry
    /// returns the same payload.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Client(408) => true,
            ErrorKind::Client(status) => !(400..=499).contains(status),
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::Server(_) => true,
            ErrorKind::Overloaded | ErrorKind::Validation | ErrorKind::Cancelled => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::Client(status) => write!(f, "client error ({})", status),
            ErrorKind::Server(status) => write!(f, "server error ({})", status),
            ErrorKind::Overloaded => write!(f, "overloaded"),
            ErrorKind::Validation => write!(f, "validation error"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle of a single logical request inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    /// Waiting out the backoff before attempt number `attempt` (1-based retry count).
    Retrying { attempt: u32 },
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }
}

/// Where the value rendered for a dashboard source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    /// Fetched from the API during this load.
    Network,
    /// Served from a fresh cache entry.
    Cache,
    /// The fetch failed and an expired cache entry was used instead.
    StaleCache,
    /// The fetch failed and nothing was cached; a neutral default is shown.
    Fallback,
}

/// The independent data sources behind one dashboard snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Portfolio,
    Funds,
    Rank,
    Leaderboard,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Portfolio => "portfolio",
            SourceKind::Funds => "funds",
            SourceKind::Rank => "rank",
            SourceKind::Leaderboard => "leaderboard",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_final_except_request_timeout() {
        assert!(!ErrorKind::Client(400).is_retryable());
        assert!(!ErrorKind::Client(404).is_retryable());
        assert!(!ErrorKind::Client(499).is_retryable());
        assert!(ErrorKind::Client(408).is_retryable());
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Server(503).is_retryable());
        assert!(!ErrorKind::Overloaded.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn status_codes_map_onto_the_taxonomy() {
        assert_eq!(ErrorKind::from_status(429), ErrorKind::Client(429));
        assert_eq!(ErrorKind::from_status(502), ErrorKind::Server(502));
    }
}
