use crate::error::ApiError;
use configuration::ClientConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// One logical fetch, as tracked by the orchestrator.
///
/// `url` is relative to the client's base URL. `retry_count` starts at zero and
/// is advanced by the orchestrator each time it schedules a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub id: Uuid,
    pub url: String,
    pub params: BTreeMap<String, String>,
    pub timeout: Duration,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl RequestDescriptor {
    /// A fresh descriptor carrying the configured timeout and retry budget.
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            params: BTreeMap::new(),
            timeout: config.timeout(),
            retry_count: 0,
            max_retries: config.max_retries,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether another retry fits in the budget.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// `url` joined onto `base_url`, with `params` as the query string.
    pub fn full_url(&self, base_url: &str) -> Result<String, ApiError> {
        let mut url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        );
        if !self.params.is_empty() {
            let query = serde_qs::to_string(&self.params)
                .map_err(|e| ApiError::RequestBuild(e.to_string()))?;
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}
