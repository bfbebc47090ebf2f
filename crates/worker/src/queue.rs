//! Reliable queue on top of Redis lists.
//!
//! Producers `LPUSH` onto `<queue>`. A fetch atomically moves the oldest item
//! into `<queue>:processing`, where it stays until it is acknowledged
//! (removed) or released (pushed back for redelivery). A released item goes
//! to the producer end, behind everything already waiting, so one bad item
//! never blocks the items queued after it. Items stranded in the processing
//! list by a crash are moved back by `recover` at startup.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use relay_common::error::AppError;

/// One fetched, not yet settled queue item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Take at most one item without blocking. `None` when the queue is empty.
    async fn fetch(&self) -> Result<Option<Delivery>, AppError>;

    /// Settle the item for good.
    async fn ack(&self, delivery: &Delivery) -> Result<(), AppError>;

    /// Return an unacknowledged item to the back of the queue for redelivery.
    async fn release(&self, delivery: &Delivery) -> Result<(), AppError>;
}

pub struct RedisQueue {
    redis: ConnectionManager,
    queue: String,
    processing: String,
}

impl RedisQueue {
    pub fn new(redis: ConnectionManager, queue: impl Into<String>) -> Self {
        let queue = queue.into();
        Self {
            processing: format!("{}:processing", queue),
            redis,
            queue,
        }
    }

    pub fn name(&self) -> &str {
        &self.queue
    }

    /// Move everything left in the processing list back onto the queue.
    ///
    /// The newest in-flight item is moved first so the oldest ends up at the
    /// consumer end. Returns the number of items recovered.
    pub async fn recover(&self) -> Result<u64, AppError> {
        let mut redis = self.redis.clone();
        let mut recovered = 0u64;

        loop {
            let moved: Option<Vec<u8>> = redis::cmd("LMOVE")
                .arg(&self.processing)
                .arg(&self.queue)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut redis)
                .await?;

            if moved.is_none() {
                break;
            }
            recovered += 1;
        }

        if recovered > 0 {
            tracing::warn!(
                queue = %self.queue,
                recovered,
                "Recovered unacknowledged messages from a previous run"
            );
        }

        Ok(recovered)
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn fetch(&self) -> Result<Option<Delivery>, AppError> {
        let mut redis = self.redis.clone();

        // LMOVE <queue> <queue>:processing RIGHT LEFT
        // Returns nil when the queue is empty.
        let payload: Option<Vec<u8>> = redis::cmd("LMOVE")
            .arg(&self.queue)
            .arg(&self.processing)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut redis)
            .await?;

        Ok(payload.map(|payload| Delivery { payload }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), AppError> {
        let mut redis = self.redis.clone();

        let removed: i64 = redis::cmd("LREM")
            .arg(&self.processing)
            .arg(1)
            .arg(&delivery.payload)
            .query_async(&mut redis)
            .await?;

        if removed == 0 {
            tracing::warn!(queue = %self.queue, "Acked message was not in the processing list");
        }
        Ok(())
    }

    async fn release(&self, delivery: &Delivery) -> Result<(), AppError> {
        let mut redis = self.redis.clone();

        let _: () = redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.processing)
            .arg(1)
            .arg(&delivery.payload)
            .ignore()
            .cmd("LPUSH")
            .arg(&self.queue)
            .arg(&delivery.payload)
            .ignore()
            .query_async(&mut redis)
            .await?;

        Ok(())
    }
}
