use std::net::SocketAddr;
use std::sync::Arc;

use relay_api::routes::create_router;
use relay_api::state::AppState;
use relay_common::config::AppConfig;
use relay_common::redis_pool::create_redis_pool;
use relay_common::types::QueueKind;
use relay_engine::content::{ApiNinjasClient, OpenWeatherClient};
use relay_engine::digest::DigestComposer;
use relay_engine::router::MessageRouter;
use relay_notifier::email::SmtpMailer;
use relay_notifier::retry::RetryPolicy;
use relay_notifier::slack::SlackNotifier;
use relay_notifier::telegram::TelegramNotifier;
use relay_worker::poller::QueuePoller;
use relay_worker::queue::RedisQueue;
use relay_worker::scheduler::DigestScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relay_worker=info,relay_engine=info,relay_notifier=info,relay_api=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Notification relay starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(queue = %config.queue_name, queue_kind = %config.queue_kind, "Configuration loaded");

    // Connect to Redis and bring back anything a previous run left in flight
    let redis = create_redis_pool(&config.redis_url).await?;
    let queue = Arc::new(RedisQueue::new(redis, config.queue_name.clone()));
    queue.recover().await?;
    tracing::info!(queue = queue.name(), "Redis queue ready");

    // Build the adapter for the bound queue kind
    let mut router = MessageRouter::new();
    let mut telegram = None;
    match config.queue_kind {
        QueueKind::InstantMessage => {
            let token = config
                .telegram_bot_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT is not set"))?;
            let notifier = Arc::new(TelegramNotifier::new(token, config.telegram_api_url.clone()));
            telegram = Some(notifier.clone());
            router = router.with_instant(notifier);
        }
        QueueKind::Email => {
            let smtp = config
                .smtp
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("EMAIL_HOST is not set"))?;
            router = router.with_mail(Arc::new(SmtpMailer::new(smtp)?));
        }
        QueueKind::TeamChat => {
            let token = config
                .slack_bot_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SLACK_BOT_TOKEN is not set"))?;
            router = router.with_team_chat(Arc::new(SlackNotifier::new(
                token,
                config.slack_api_url.clone(),
                RetryPolicy::new(config.slack_lookup_max_attempts),
            )));
        }
    }
    let router = Arc::new(router);

    // HTTP server
    let state = AppState::new(config.clone(), router.confirmations());
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server exited with error");
        }
    });

    // Daily digest, only next to the instant-message channel
    if let (true, Some(messenger), Some(quote_key)) = (
        config.digest_enabled(),
        telegram,
        config.quote_api_key.clone(),
    ) {
        if config.weather_api_key.is_none() {
            tracing::warn!("WEATHER_API is not set, digest weather lines will be unavailable");
        }
        let composer = Arc::new(DigestComposer::new(
            Arc::new(ApiNinjasClient::new(config.content_api_url.clone(), quote_key)),
            Arc::new(OpenWeatherClient::new(
                config.weather_api_url.clone(),
                config.weather_api_key.clone().unwrap_or_default(),
            )),
            messenger,
            config.digest_chat_id.clone(),
            config.digest_cities.clone(),
        ));
        let scheduler = DigestScheduler::new(composer, &config.digest_cron, &config.digest_timezone)?;
        tracing::info!(cron = %config.digest_cron, timezone = %config.digest_timezone, "Digest scheduler enabled");
        tokio::spawn(async move {
            if let Err(e) = scheduler.run().await {
                tracing::error!(error = %e, "Digest scheduler exited with error");
            }
        });
    }

    let poller = Arc::new(QueuePoller::new(
        queue,
        router,
        config.queue_kind,
        config.poll_interval(),
    ));

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = poller.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Queue poller exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Notification relay stopped.");
    Ok(())
}
