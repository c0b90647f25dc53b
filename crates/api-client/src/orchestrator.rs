use crate::descriptor::RequestDescriptor;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use configuration::ClientConfig;
use core_types::{ErrorKind, FetchFailure, FetchOutcome, RequestState};
use events::{DashboardEvent, EventBus, RetryScheduled};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Issues logical fetches under timeout, retry, admission, and cancellation rules.
///
/// Admission is a hard gate: once `concurrency_limit` logical requests are in
/// flight, further calls fail immediately with `Overloaded` instead of queueing.
/// A request holds its admission permit across all of its retries.
pub struct RequestOrchestrator {
    permits: Arc<Semaphore>,
    limit: usize,
    policy: RetryPolicy,
    /// Parent of every in-flight request's token; replaced after `abort_all`.
    cancel_root: Mutex<CancellationToken>,
    /// Live request states, keyed by descriptor id. Entries are removed on settle.
    tracked: Mutex<HashMap<Uuid, RequestState>>,
    events: Option<EventBus>,
}

impl RequestOrchestrator {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.concurrency_limit)),
            limit: config.concurrency_limit,
            policy: RetryPolicy::from_config(config),
            cancel_root: Mutex::new(CancellationToken::new()),
            tracked: Mutex::new(HashMap::new()),
            events: None,
        }
    }

    /// Publishes retry and rejection notifications on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of logical requests currently admitted.
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Number of requests currently waiting out a backoff delay.
    pub fn pending_retries(&self) -> usize {
        self.tracked_lock()
            .values()
            .filter(|state| matches!(state, RequestState::Retrying { .. }))
            .count()
    }

    /// The current state of a tracked request, if it has not settled yet.
    pub fn state_of(&self, id: Uuid) -> Option<RequestState> {
        self.tracked_lock().get(&id).copied()
    }

    /// Cancels every in-flight request. Their outcomes become `Cancelled`, and
    /// any response that arrives afterwards is discarded with the dropped future.
    /// Requests started after this call are unaffected.
    pub fn abort_all(&self) {
        let mut root = self.cancel_root.lock().unwrap_or_else(PoisonError::into_inner);
        root.cancel();
        *root = CancellationToken::new();
        tracing::info!("Aborted all in-flight requests.");
    }

    fn tracked_lock(&self) -> MutexGuard<'_, HashMap<Uuid, RequestState>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn child_token(&self) -> CancellationToken {
        self.cancel_root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .child_token()
    }

    fn transition(&self, id: Uuid, state: RequestState) {
        let mut tracked = self.tracked_lock();
        if state.is_terminal() {
            tracked.remove(&id);
        } else {
            tracked.insert(id, state);
        }
    }

    fn publish(&self, event: DashboardEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    /// Runs `operation` until it succeeds, fails terminally, or runs out of retries.
    ///
    /// Each attempt races the operation's future against `descriptor.timeout`;
    /// the loser is dropped, so exactly one network call is alive per attempt and
    /// a timed-out call can never deliver its result later.
    pub async fn execute<T, F, Fut>(
        &self,
        mut descriptor: RequestDescriptor,
        mut operation: F,
    ) -> FetchOutcome<T>
    where
        F: FnMut(RequestDescriptor) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Ok(_permit) = self.permits.clone().try_acquire_owned() else {
            tracing::warn!(
                request_id = %descriptor.id,
                url = %descriptor.url,
                limit = self.limit,
                "Concurrency limit reached; request rejected."
            );
            self.publish(DashboardEvent::RequestRejected {
                request_id: descriptor.id,
                url: descriptor.url.clone(),
            });
            return FetchOutcome::failure(ErrorKind::Overloaded, "concurrency limit reached");
        };

        let token = self.child_token();
        let id = descriptor.id;
        self.transition(id, RequestState::Pending);

        loop {
            let attempt = operation(descriptor.clone());
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchFailure::new(ErrorKind::Cancelled, "request aborted")),
                settled = tokio::time::timeout(descriptor.timeout, attempt) => match settled {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(FetchFailure::new(e.kind(), e.to_string())),
                    Err(_) => Err(FetchFailure::new(
                        ErrorKind::Timeout,
                        format!("no response within {}ms", descriptor.timeout.as_millis()),
                    )),
                },
            };

            let failure = match result {
                Ok(value) => {
                    tracing::debug!(request_id = %id, url = %descriptor.url, retries = descriptor.retry_count, "Request succeeded.");
                    self.transition(id, RequestState::Succeeded);
                    return FetchOutcome::Success(value);
                }
                Err(failure) => failure,
            };

            if !failure.retryable || !descriptor.can_retry() {
                tracing::warn!(
                    request_id = %id,
                    url = %descriptor.url,
                    kind = %failure.kind,
                    retries = descriptor.retry_count,
                    "Request failed."
                );
                self.transition(id, RequestState::Failed);
                return FetchOutcome::Failure(failure);
            }

            let delay = self.policy.delay_for(descriptor.retry_count);
            let attempt_number = descriptor.retry_count + 1;
            tracing::info!(
                request_id = %id,
                url = %descriptor.url,
                kind = %failure.kind,
                attempt = attempt_number,
                delay_ms = delay.as_millis() as u64,
                "Retrying request."
            );
            self.transition(id, RequestState::Retrying { attempt: attempt_number });
            self.publish(DashboardEvent::RetryScheduled(RetryScheduled {
                request_id: id,
                url: descriptor.url.clone(),
                attempt: attempt_number,
                delay_ms: delay.as_millis() as u64,
                kind: failure.kind,
            }));

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.transition(id, RequestState::Failed);
                    return FetchOutcome::failure(ErrorKind::Cancelled, "request aborted during backoff");
                }
                _ = tokio::time::sleep(delay) => {}
            }
            descriptor.retry_count = attempt_number;
        }
    }
}
