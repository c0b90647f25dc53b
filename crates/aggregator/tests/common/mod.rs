#![allow(dead_code)]

use aggregator::Aggregator;
use api_client::descriptor::RequestDescriptor;
use api_client::error::ApiError;
use api_client::{ApiClient, DashboardApi, RequestOrchestrator};
use async_trait::async_trait;
use cache::{CacheStore, ManualClock};
use configuration::{CacheSettings, ClientConfig, ValidationSettings};
use events::{DashboardEvent, EventBus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use validation::Validator;

pub type Response = Result<Value, u16>;

/// An in-memory game API. Each URL replays its queue; the last response repeats.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<HashMap<String, Vec<Response>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn script(&self, url: &str, responses: Vec<Response>) {
        self.responses.lock().unwrap().insert(url.to_string(), responses);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn get_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(request.url.clone());
        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(&request.url) else {
            return Err(ApiError::Status {
                status: 404,
                body: String::new(),
            });
        };
        let next = if queue.len() > 1 { queue.remove(0) } else { queue[0].clone() };
        next.map_err(|status| ApiError::Status {
            status,
            body: String::new(),
        })
    }
}

pub struct Harness {
    pub aggregator: Aggregator,
    pub client: Arc<ScriptedClient>,
    pub clock: Arc<ManualClock>,
    pub events: broadcast::Receiver<DashboardEvent>,
}

impl Harness {
    pub fn new() -> Self {
        let config = ClientConfig::default();
        let bus = EventBus::default();
        let client = Arc::new(ScriptedClient::default());
        let orchestrator = Arc::new(RequestOrchestrator::new(&config).with_events(bus.clone()));
        let api = DashboardApi::new(client.clone(), orchestrator, config);
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(CacheStore::with_clock(CacheSettings::default(), clock.clone()));
        let events = bus.subscribe();
        let aggregator = Aggregator::new(api, cache, Validator::new(ValidationSettings::default()), bus);

        Self {
            aggregator,
            client,
            clock,
            events,
        }
    }

    /// Every event published since the last drain.
    pub fn drain_events(&mut self) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
