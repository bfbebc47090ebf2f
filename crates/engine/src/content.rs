//! Upstream content for the daily digest: quote/fact/joke/riddle and weather.

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use relay_common::error::AppError;

/// The four content endpoints the digest picks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Quote,
    Fact,
    Joke,
    Riddle,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Quote,
        ContentKind::Fact,
        ContentKind::Joke,
        ContentKind::Riddle,
    ];

    /// Pick one kind uniformly at random.
    pub fn random() -> Self {
        let index = rand::thread_rng().gen_range(0..Self::ALL.len());
        Self::ALL[index]
    }

    pub fn path(&self) -> &'static str {
        match self {
            ContentKind::Quote => "quotes",
            ContentKind::Fact => "facts",
            ContentKind::Joke => "jokes",
            ContentKind::Riddle => "riddles",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// One formatted content item. Only riddles carry an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub body: String,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temp: f64,
    pub description: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, kind: ContentKind) -> Result<ContentItem, AppError>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, AppError>;
}

/// Format the first element of a content endpoint's JSON array.
pub fn format_item(kind: ContentKind, data: &Value) -> Result<ContentItem, AppError> {
    let first = data
        .get(0)
        .ok_or_else(|| AppError::Decode(format!("{} response is empty", kind)))?;
    let field = |name: &'static str| str_field(first, kind, name);

    let item = match kind {
        ContentKind::Quote => ContentItem {
            body: format!("Цитата: \n{} \n (c) {}", field("quote")?, field("author")?),
            answer: None,
        },
        ContentKind::Fact => ContentItem {
            body: format!("Факт: \n{}", field("fact")?),
            answer: None,
        },
        ContentKind::Joke => ContentItem {
            body: format!("Жарт: \n{}", field("joke")?),
            answer: None,
        },
        ContentKind::Riddle => ContentItem {
            body: format!("Загадка: \n{}", field("question")?),
            answer: Some(field("answer")?.to_string()),
        },
    };

    Ok(item)
}

fn str_field<'a>(item: &'a Value, kind: ContentKind, name: &str) -> Result<&'a str, AppError> {
    item.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Decode(format!("{} response has no '{}'", kind, name)))
}

/// Key-authenticated client for the quote/fact/joke/riddle endpoints.
pub struct ApiNinjasClient {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApiNinjasClient {
    pub fn new(api_base: impl Into<String>, api_key: String) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentSource for ApiNinjasClient {
    async fn fetch(&self, kind: ContentKind) -> Result<ContentItem, AppError> {
        let data: Value = self
            .client
            .get(format!("{}/{}", self.api_base, kind.path()))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        format_item(kind, &data)
    }
}

/// Current-weather client.
pub struct OpenWeatherClient {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(api_base: impl Into<String>, api_key: String) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport, AppError> {
        let data: Value = self
            .client
            .get(format!("{}/weather", self.api_base))
            .query(&[
                ("q", city),
                ("units", "metric"),
                ("lang", "ua"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let temp = data
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::Decode(format!("weather for {} has no temperature", city)))?;
        let description = data
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(WeatherReport { temp, description })
    }
}
