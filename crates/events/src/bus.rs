use crate::messages::DashboardEvent;
use tokio::sync::broadcast;

/// Default number of buffered events before slow subscribers start lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// A cloneable handle to the notification channel.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Registers a new subscriber. It only sees events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn publish(&self, event: DashboardEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(event = name, "No subscribers for event.");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A long-running task that listens to the bus and mirrors every event into the log.
pub async fn run_event_logger(mut event_rx: broadcast::Receiver<DashboardEvent>) {
    tracing::debug!("Event logger started.");

    loop {
        match event_rx.recv().await {
            Ok(event) => match &event {
                DashboardEvent::SourceFailed { user_id, source, kind, origin } => {
                    tracing::debug!(%user_id, %source, %kind, ?origin, "Dashboard source degraded.");
                }
                DashboardEvent::RequestRejected { url, .. } => {
                    tracing::debug!(%url, "Request rejected by admission control.");
                }
                other => {
                    let payload = other.to_json().unwrap_or_else(|e| e.to_string());
                    tracing::debug!(event = other.name(), %payload, "Dashboard event.");
                }
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event logger lagged, skipped {} messages.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Event bus closed. Event logger shutting down.");
                break;
            }
        }
    }
}
