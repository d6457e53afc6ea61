use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::resolver::API_TIMEOUT;

const WEATHER_URL: &str = "https://wttr.in";
const WEATHER_SEPARATOR: &str = " . ";
const NEWS_DESCRIPTION_LIMIT: usize = 200;

/// Builds the spoken weather and news bulletin.
pub struct Announcer {
    http: reqwest::Client,
    cities: Vec<String>,
    news_feed: String,
    weather_url: String,
}

impl Announcer {
    pub fn new(http: reqwest::Client, cities: Vec<String>, news_feed: String) -> Self {
        Self {
            http,
            cities,
            news_feed,
            weather_url: WEATHER_URL.to_string(),
        }
    }

    /// Points weather lookups at another wttr.in-compatible host.
    pub fn with_weather_url(mut self, weather_url: impl Into<String>) -> Self {
        self.weather_url = weather_url.into();
        self
    }

    /// Cities that fail are left out; all failing gives "".
    pub async fn weather_bulletin(&self) -> String {
        let mut reports = Vec::new();
        for city in &self.cities {
            match self.city_weather(city).await {
                Ok(Some(report)) => reports.push(format!("{city}: {report}")),
                Ok(None) => debug!("no weather for {city}"),
                Err(e) => debug!("weather for {city} failed: {e}"),
            }
        }
        reports.join(WEATHER_SEPARATOR)
    }

    async fn city_weather(&self, city: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}/{city}?format=%t+%C", self.weather_url);
        let resp = self.http.get(url).timeout(API_TIMEOUT).send().await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }
        let text = resp.text().await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    pub async fn news_bulletin(&self) -> String {
        match self.fetch_feed().await {
            Ok(body) => news_from_feed(&body),
            Err(e) => {
                warn!("news feed unavailable: {e}");
                String::new()
            }
        }
    }

    async fn fetch_feed(&self) -> Result<Vec<u8>, reqwest::Error> {
        let resp = self
            .http
            .get(&self.news_feed)
            .timeout(API_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub async fn compose(&self) -> String {
        let weather = self.weather_bulletin().await;
        let news = self.news_bulletin().await;
        bulletin_text(&weather, &news)
    }
}

pub fn bulletin_text(weather: &str, news: &str) -> String {
    format!("Das Wetter. {weather}. Und nun die Nachrichten. {news}. Weiter geht es mit Musik.")
}

/// First feed item as a spoken sentence. Unparseable feeds give "".
pub fn news_from_feed(body: &[u8]) -> String {
    let channel = match rss::Channel::read_from(body) {
        Ok(c) => c,
        Err(e) => {
            warn!("news feed unparseable: {e}");
            return String::new();
        }
    };

    let Some(item) = channel.items().first() else {
        return "Keine aktuellen Nachrichten.".to_string();
    };

    let title = item.title().unwrap_or_default().trim();
    let description = truncate_chars(
        &strip_html(item.description().unwrap_or_default()),
        NEWS_DESCRIPTION_LIMIT,
    );
    format!("Nachrichten aus Berlin: {title}. {description}")
}

fn strip_html(raw: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));
    let text = tags.replace_all(raw, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
