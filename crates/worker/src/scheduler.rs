//! Daily digest scheduling.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use relay_engine::digest::DigestComposer;

/// Parse a cron expression, accepting the common 5-field form.
///
/// The `cron` crate wants seconds first and an optional year last, so a
/// 5-field expression gets a leading `0` and a trailing `*`.
pub fn parse_schedule(expr: &str) -> anyhow::Result<Schedule> {
    expr.parse::<Schedule>()
        .or_else(|_| format!("0 {expr} *").parse::<Schedule>())
        .map_err(|e| anyhow::anyhow!("invalid cron expression '{expr}': {e}"))
}

pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("unknown timezone: {name}"))
}

/// Next fire time strictly after `now`, evaluated in `tz`.
pub fn next_fire(schedule: &Schedule, tz: Tz, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule
        .after(&now.with_timezone(&tz))
        .next()
        .map(|dt| dt.with_timezone(&Utc))
}

pub struct DigestScheduler {
    composer: Arc<DigestComposer>,
    schedule: Schedule,
    tz: Tz,
}

impl DigestScheduler {
    pub fn new(composer: Arc<DigestComposer>, expr: &str, timezone: &str) -> anyhow::Result<Self> {
        Ok(Self {
            composer,
            schedule: parse_schedule(expr)?,
            tz: parse_timezone(timezone)?,
        })
    }

    /// Sleep until each fire time and send the digest. Runs until cancelled.
    pub async fn run(&self) -> anyhow::Result<()> {
        loop {
            let now = Utc::now();
            let Some(next) = next_fire(&self.schedule, self.tz, now) else {
                tracing::warn!("Digest schedule has no future runs, stopping");
                return Ok(());
            };

            tracing::info!(next = %next, "Next digest scheduled");
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if let Err(e) = self.composer.compose_and_send().await {
                tracing::error!(error = %e, "Failed to send digest");
            }
        }
    }
}
