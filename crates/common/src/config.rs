use std::time::Duration;

use serde::Deserialize;

use crate::types::QueueKind;

/// SMTP transport settings for the email channel.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Default sender when a payload does not carry its own.
    pub from: Option<String>,
}

/// Global relay configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection string (queue broker)
    pub redis_url: String,

    /// Name of the Redis list this process consumes
    pub queue_name: String,

    /// Channel the bound queue feeds
    pub queue_kind: QueueKind,

    /// Queue polling interval in milliseconds (default: 10000)
    pub poll_interval_ms: u64,

    /// HTTP listen port
    pub port: u16,

    /// Telegram bot token
    pub telegram_bot_token: Option<String>,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Slack bot token (xoxb-...)
    pub slack_bot_token: Option<String>,

    /// Slack signing secret for interaction webhooks
    pub slack_signing_secret: Option<String>,

    /// Slack Web API base URL
    pub slack_api_url: String,

    /// Attempts allowed for a rate-limited Slack user lookup
    pub slack_lookup_max_attempts: u32,

    /// SMTP settings, present when EMAIL_HOST is set
    pub smtp: Option<SmtpConfig>,

    /// API key for the quote/fact/joke/riddle endpoints
    pub quote_api_key: Option<String>,

    /// Base URL of the content API
    pub content_api_url: String,

    /// API key for the weather endpoint
    pub weather_api_key: Option<String>,

    /// Base URL of the weather API
    pub weather_api_url: String,

    /// Chat that receives the daily digest
    pub digest_chat_id: String,

    /// Cron expression for the digest (5 or 6 fields)
    pub digest_cron: String,

    /// IANA timezone the digest cron is evaluated in
    pub digest_timezone: String,

    /// Cities included in the digest weather block, in order
    pub digest_cities: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let queue_name = std::env::var("QUEUE_NAME")
            .map_err(|_| anyhow::anyhow!("QUEUE_NAME environment variable is required"))?;
        let queue_kind = QueueKind::from_queue_name(&queue_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown queue: {}", queue_name))?;

        let smtp = match std::env::var("EMAIL_HOST").ok() {
            Some(host) => Some(SmtpConfig {
                host,
                port: std::env::var("EMAIL_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("EMAIL_PORT must be a valid u16"))?,
                username: std::env::var("EMAIL_USERNAME").map_err(|_| {
                    anyhow::anyhow!("EMAIL_USERNAME is required when EMAIL_HOST is set")
                })?,
                password: std::env::var("EMAIL_PASSWORD").map_err(|_| {
                    anyhow::anyhow!("EMAIL_PASSWORD is required when EMAIL_HOST is set")
                })?,
                from: std::env::var("EMAIL_FROM").ok(),
            }),
            None => None,
        };

        let config = Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            queue_name,
            queue_kind,
            poll_interval_ms: std::env::var("QUEUE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUEUE_POLL_INTERVAL_MS must be a valid u64"))?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
            telegram_bot_token: std::env::var("TELEGRAM_BOT")
                .or_else(|_| std::env::var("TELEGRAM_BOT_TOKEN"))
                .ok(),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            slack_bot_token: std::env::var("SLACK_BOT_TOKEN").ok(),
            slack_signing_secret: std::env::var("SLACK_SIGNING_SECRET").ok(),
            slack_api_url: std::env::var("SLACK_API_URL")
                .unwrap_or_else(|_| "https://slack.com/api".to_string()),
            slack_lookup_max_attempts: std::env::var("SLACK_LOOKUP_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SLACK_LOOKUP_MAX_ATTEMPTS must be a valid u32"))?,
            smtp,
            quote_api_key: std::env::var("QUOTE_API").ok(),
            content_api_url: std::env::var("CONTENT_API_URL")
                .unwrap_or_else(|_| "https://api.api-ninjas.com/v1".to_string()),
            weather_api_key: std::env::var("WEATHER_API").ok(),
            weather_api_url: std::env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "http://api.openweathermap.org/data/2.5".to_string()),
            digest_chat_id: std::env::var("DIGEST_CHAT_ID")
                .unwrap_or_else(|_| "-1002197881869".to_string()),
            digest_cron: std::env::var("DIGEST_CRON")
                .unwrap_or_else(|_| "0 0 10 * * *".to_string()),
            digest_timezone: std::env::var("DIGEST_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Kyiv".to_string()),
            digest_cities: parse_list(
                &std::env::var("DIGEST_CITIES")
                    .unwrap_or_else(|_| "Kharkiv,Kyiv,Dnipro".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the adapter for the bound queue kind has its credentials.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("QUEUE_POLL_INTERVAL_MS must be greater than zero");
        }
        if self.slack_lookup_max_attempts == 0 {
            anyhow::bail!("SLACK_LOOKUP_MAX_ATTEMPTS must be greater than zero");
        }

        match self.queue_kind {
            QueueKind::InstantMessage if self.telegram_bot_token.is_none() => {
                anyhow::bail!("TELEGRAM_BOT is required for the instant-message queue")
            }
            QueueKind::Email if self.smtp.is_none() => {
                anyhow::bail!("EMAIL_HOST is required for the email queue")
            }
            QueueKind::TeamChat if self.slack_bot_token.is_none() => {
                anyhow::bail!("SLACK_BOT_TOKEN is required for the team-chat queue")
            }
            QueueKind::TeamChat if self.slack_signing_secret.is_none() => {
                anyhow::bail!("SLACK_SIGNING_SECRET is required for the team-chat queue")
            }
            _ => Ok(()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The digest only runs next to the instant-message channel, and only
    /// when the content API is configured.
    pub fn digest_enabled(&self) -> bool {
        self.queue_kind == QueueKind::InstantMessage && self.quote_api_key.is_some()
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
