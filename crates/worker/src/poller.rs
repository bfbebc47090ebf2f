use std::sync::Arc;
use std::time::Duration;

use relay_common::error::AppError;
use relay_common::types::QueueKind;
use relay_decoders::parse_payload;
use relay_engine::router::{MessageRouter, RouteOutcome};

use crate::queue::MessageQueue;

/// What one poll did with the queue.
#[derive(Debug)]
pub enum PollOutcome {
    /// Nothing to fetch.
    Empty,
    /// The payload was routed and the message acknowledged.
    Acked(RouteOutcome),
    /// The payload could not be parsed; the message was released unacknowledged.
    Released(AppError),
}

/// Polls the bound queue on a fixed period and routes each message.
pub struct QueuePoller {
    queue: Arc<dyn MessageQueue>,
    router: Arc<MessageRouter>,
    kind: QueueKind,
    poll_interval: Duration,
}

impl QueuePoller {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        router: Arc<MessageRouter>,
        kind: QueueKind,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            router,
            kind,
            poll_interval,
        }
    }

    /// Start the polling loop. Runs indefinitely until the task is cancelled.
    ///
    /// Every tick runs in its own task, so a slow tick never delays the next.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        tracing::info!(
            queue_kind = %self.kind,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Queue poller started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;

            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = poller.poll_once().await {
                    tracing::error!(queue_kind = %poller.kind, error = %e, "Queue poll failed");
                }
            });
        }
    }

    /// Fetch at most one message, route it, and settle it.
    ///
    /// Routed messages are acknowledged whatever the delivery result. Only a
    /// payload that is not valid JSON is left unacknowledged.
    pub async fn poll_once(&self) -> Result<PollOutcome, AppError> {
        let Some(delivery) = self.queue.fetch().await? else {
            tracing::debug!(queue_kind = %self.kind, "Queue empty");
            return Ok(PollOutcome::Empty);
        };

        let payload = match parse_payload(&delivery.payload) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    queue_kind = %self.kind,
                    error = %e,
                    bytes = delivery.payload.len(),
                    "Undecodable payload, leaving unacknowledged"
                );
                self.queue.release(&delivery).await?;
                return Ok(PollOutcome::Released(e));
            }
        };

        let outcome = self.router.route(self.kind, &payload).await;
        self.queue.ack(&delivery).await?;

        Ok(PollOutcome::Acked(outcome))
    }
}
