use crate::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::orchestrator::RequestOrchestrator;
use crate::responses;
use configuration::ClientConfig;
use core_types::{FetchOutcome, Holding, RankInfo, RawLeaderboardEntry};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Request descriptors for every endpoint the dashboard reads.
pub mod endpoints {
    use super::*;

    /// `/users/{id}/{resource}` with the id percent-encoded as a single path segment.
    fn user_path(user_id: &str, resource: &str) -> String {
        format!("/users/{}/{}", urlencoding::encode(user_id), resource)
    }

    pub fn portfolio(user_id: &str, config: &ClientConfig) -> RequestDescriptor {
        RequestDescriptor::new(user_path(user_id, "portfolio"), config)
    }

    pub fn funds(user_id: &str, config: &ClientConfig) -> RequestDescriptor {
        RequestDescriptor::new(user_path(user_id, "funds"), config)
    }

    pub fn rank(user_id: &str, config: &ClientConfig) -> RequestDescriptor {
        RequestDescriptor::new(user_path(user_id, "rank"), config)
    }

    pub fn leaderboard(config: &ClientConfig) -> RequestDescriptor {
        RequestDescriptor::new("/leaderboard", config)
    }
}

/// Typed, orchestrated access to the game API.
///
/// Every call goes through the shared orchestrator, so all of them count
/// against the same concurrency limit and obey `abort_all`.
#[derive(Clone)]
pub struct DashboardApi {
    client: Arc<dyn ApiClient>,
    orchestrator: Arc<RequestOrchestrator>,
    config: ClientConfig,
}

impl DashboardApi {
    pub fn new(
        client: Arc<dyn ApiClient>,
        orchestrator: Arc<RequestOrchestrator>,
        config: ClientConfig,
    ) -> Self {
        Self {
            client,
            orchestrator,
            config,
        }
    }

    pub fn orchestrator(&self) -> &Arc<RequestOrchestrator> {
        &self.orchestrator
    }

    pub async fn fetch_portfolio(&self, user_id: &str) -> FetchOutcome<Vec<Holding>> {
        let client = Arc::clone(&self.client);
        self.orchestrator
            .execute(endpoints::portfolio(user_id, &self.config), move |request| {
                let client = Arc::clone(&client);
                async move { responses::parse_portfolio(client.get_json(&request).await?) }
            })
            .await
    }

    pub async fn fetch_funds(&self, user_id: &str) -> FetchOutcome<Decimal> {
        let client = Arc::clone(&self.client);
        self.orchestrator
            .execute(endpoints::funds(user_id, &self.config), move |request| {
                let client = Arc::clone(&client);
                async move { responses::parse_funds(client.get_json(&request).await?) }
            })
            .await
    }

    pub async fn fetch_rank(&self, user_id: &str) -> FetchOutcome<RankInfo> {
        let client = Arc::clone(&self.client);
        self.orchestrator
            .execute(endpoints::rank(user_id, &self.config), move |request| {
                let client = Arc::clone(&client);
                async move { responses::parse_rank(client.get_json(&request).await?) }
            })
            .await
    }

    pub async fn fetch_leaderboard(&self) -> FetchOutcome<Vec<RawLeaderboardEntry>> {
        let client = Arc::clone(&self.client);
        self.orchestrator
            .execute(endpoints::leaderboard(&self.config), move |request| {
                let client = Arc::clone(&client);
                async move { responses::parse_leaderboard(client.get_json(&request).await?) }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use core_types::ErrorKind;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replays canned responses per URL; the last response for a URL repeats.
    struct ScriptedClient {
        responses: Mutex<HashMap<String, Vec<Result<Value, u16>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<(&str, Vec<Result<Value, u16>>)>) -> Self {
            Self {
                responses: Mutex::new(
                    script.into_iter().map(|(url, r)| (url.to_string(), r)).collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ApiClient for ScriptedClient {
        async fn get_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push(request.url.clone());
            let mut responses = self.responses.lock().unwrap();
            let queue = responses
                .get_mut(&request.url)
                .ok_or(ApiError::Status { status: 404, body: String::new() })?;
            let next = if queue.len() > 1 { queue.remove(0) } else { queue[0].clone() };
            next.map_err(|status| ApiError::Status { status, body: String::new() })
        }
    }

    fn api(client: ScriptedClient) -> (DashboardApi, Arc<ScriptedClient>) {
        let config = ClientConfig::default();
        let client = Arc::new(client);
        let orchestrator = Arc::new(RequestOrchestrator::new(&config));
        (DashboardApi::new(client.clone(), orchestrator, config), client)
    }

    #[tokio::test(start_paused = true)]
    async fn typed_fetches_parse_their_payloads() {
        let (api, _) = api(ScriptedClient::new(vec![
            ("/users/u1/funds", vec![Ok(json!(1234.5))]),
            ("/users/u1/rank", vec![Ok(json!("2 / 9"))]),
            (
                "/users/u1/portfolio",
                vec![Ok(json!([{"symbol": "NVDA", "investedValue": 10, "currentValue": 15}]))],
            ),
        ]));

        assert_eq!(api.fetch_funds("u1").await, FetchOutcome::Success(dec!(1234.5)));
        assert_eq!(
            api.fetch_rank("u1").await,
            FetchOutcome::Success(RankInfo { rank: 2, total: 9 })
        );
        let holdings = api.fetch_portfolio("u1").await.into_result().unwrap();
        assert_eq!(holdings[0].symbol, "NVDA");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_through_the_orchestrator() {
        let (api, client) = api(ScriptedClient::new(vec![(
            "/users/u1/funds",
            vec![Err(503), Err(500), Ok(json!(10))],
        )]));

        assert_eq!(api.fetch_funds("u1").await, FetchOutcome::Success(dec!(10)));
        assert_eq!(client.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payloads_fail_without_retry() {
        let (api, client) = api(ScriptedClient::new(vec![("/users/u1/rank", vec![Ok(json!("first"))])]));

        assert_eq!(api.fetch_rank("u1").await.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(client.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn user_ids_stay_inside_their_path_segment() {
        let config = ClientConfig::default();
        assert_eq!(endpoints::funds("u1", &config).url, "/users/u1/funds");
        assert_eq!(
            endpoints::portfolio("../admin?x=1", &config).url,
            "/users/..%2Fadmin%3Fx%3D1/portfolio"
        );
        assert_eq!(endpoints::rank("a b/c", &config).url, "/users/a%20b%2Fc/rank");
    }
}
