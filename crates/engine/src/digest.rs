//! Daily digest composer.
//!
//! Picks one content item at random, appends the weather for a fixed list of
//! cities, and sends the result to the instant-messaging channel. Riddles get a
//! second MarkdownV2 message with the answer hidden in a spoiler.
//!
//! Everything is best-effort: a failed content or weather fetch becomes a
//! fixed "unavailable" line and the digest still goes out.

use std::sync::Arc;

use relay_common::error::AppError;
use relay_notifier::{InstantMessenger, SendOptions};

use crate::content::{ContentKind, ContentSource, WeatherSource};
use crate::markdown::{escape_markdown_v2, spoiler};

pub const GREETING: &str = "Доброго ранку, колеги! ☀️";
pub const CONTENT_UNAVAILABLE: &str = "Повідомлення недоступне на даний момент.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub text: String,
    /// MarkdownV2 answer message, present only for riddles.
    pub answer: Option<String>,
}

pub struct DigestComposer {
    content: Arc<dyn ContentSource>,
    weather: Arc<dyn WeatherSource>,
    messenger: Arc<dyn InstantMessenger>,
    chat_id: String,
    cities: Vec<String>,
}

impl DigestComposer {
    pub fn new(
        content: Arc<dyn ContentSource>,
        weather: Arc<dyn WeatherSource>,
        messenger: Arc<dyn InstantMessenger>,
        chat_id: String,
        cities: Vec<String>,
    ) -> Self {
        Self {
            content,
            weather,
            messenger,
            chat_id,
            cities,
        }
    }

    /// Build the digest for a given content kind.
    pub async fn compose(&self, kind: ContentKind) -> Digest {
        let (content_line, answer) = match self.content.fetch(kind).await {
            Ok(item) => (
                item.body,
                item.answer.map(|a| {
                    format!("Відповідь: {}", spoiler(&escape_markdown_v2(&a)))
                }),
            ),
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Failed to fetch digest content");
                (CONTENT_UNAVAILABLE.to_string(), None)
            }
        };

        let mut weather_lines = Vec::with_capacity(self.cities.len());
        for city in &self.cities {
            weather_lines.push(format!("    {}", self.weather_line(city).await));
        }

        let text = format!(
            "{}\n\n{}\n\nПрогноз погоди на сьогодні:\n{}",
            GREETING,
            content_line,
            weather_lines.join(",\n")
        );

        Digest { text, answer }
    }

    async fn weather_line(&self, city: &str) -> String {
        match self.weather.current(city).await {
            Ok(report) => format!("Погода в {}: {}°C, {}", city, report.temp, report.description),
            Err(e) => {
                tracing::error!(city, error = %e, "Failed to fetch weather");
                format!("Погода в {} недоступна.", city)
            }
        }
    }

    /// Compose with a random content kind and send it.
    pub async fn compose_and_send(&self) -> Result<(), AppError> {
        self.send_digest(ContentKind::random()).await
    }

    /// Compose for `kind` and send the digest, then the riddle answer if any.
    ///
    /// The answer is not sent when the digest itself failed to go out.
    pub async fn send_digest(&self, kind: ContentKind) -> Result<(), AppError> {
        let digest = self.compose(kind).await;

        self.messenger
            .send_text(&self.chat_id, &digest.text, &SendOptions::default())
            .await?;

        if let Some(answer) = &digest.answer {
            self.messenger
                .send_text(&self.chat_id, answer, &SendOptions::markdown_v2())
                .await?;
        }

        tracing::info!(kind = %kind, chat_id = %self.chat_id, "Digest sent");
        Ok(())
    }
}
