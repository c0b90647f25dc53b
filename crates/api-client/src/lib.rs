use crate::descriptor::RequestDescriptor;
use crate::error::ApiError;
use async_trait::async_trait;
use configuration::ClientConfig;
use serde_json::Value;
use std::time::Duration;

pub mod dashboard;
pub mod descriptor;
pub mod error;
pub mod orchestrator;
pub mod responses;
pub mod retry;
// --- Public API ---
pub use dashboard::{DashboardApi, endpoints};
pub use orchestrator::RequestOrchestrator;
pub use retry::RetryPolicy;

/// The generic, abstract interface for the game API transport.
/// The orchestrator and dashboard layer only talk to this trait, allowing the
/// underlying implementation (HTTP or scripted test double) to be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Performs a single GET for `request` and returns the decoded JSON body.
    ///
    /// Implementations make exactly one network call and never retry; retries,
    /// timeouts and admission belong to the orchestrator.
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError>;
}

/// A concrete implementation of the `ApiClient` over HTTP.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("arena-dashboard/", env!("CARGO_PKG_VERSION")))
            // The orchestrator owns per-attempt timeouts; this only bounds connection setup.
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let url = request.full_url(&self.base_url)?;
        tracing::debug!(request_id = %request.id, %url, attempt = request.retry_count, "GET");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<Value>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}
