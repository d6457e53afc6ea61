//! Public Invidious and Piped instances. Each network is a short list of
//! mirrors asked in order; the first one answering with an audio stream wins.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{extract_video_id, pick_highest_bitrate, Backend, ResolveError, Resolved, API_TIMEOUT};

pub const INVIDIOUS_INSTANCES: &[&str] = &[
    "https://inv.tux.pizza",
    "https://invidious.jing.rocks",
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
];

pub const PIPED_INSTANCES: &[&str] = &[
    "https://pipedapi.kavin.rocks",
    "https://pipedapi.leptons.xyz",
    "https://api.piped.privacy.com.de",
];

/// Invidious reports bitrates as strings, Piped as numbers.
fn lenient_bitrate<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Deserialize)]
struct Variant {
    url: Option<String>,
    #[serde(default, rename = "type")]
    mime: Option<String>,
    #[serde(default, deserialize_with = "lenient_bitrate")]
    bitrate: u64,
}

fn best_url(variants: &[Variant]) -> Option<String> {
    let usable: Vec<&Variant> = variants.iter().filter(|v| v.url.is_some()).collect();
    pick_highest_bitrate(&usable, |v| v.bitrate).and_then(|v| v.url.clone())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
    title: Option<String>,
    #[serde(default)]
    adaptive_formats: Vec<Variant>,
    #[serde(default)]
    format_streams: Vec<Variant>,
}

impl InvidiousVideo {
    fn into_resolved(self) -> Option<Resolved> {
        let audio: Vec<Variant> = self
            .adaptive_formats
            .into_iter()
            .filter(|v| v.mime.as_deref().is_some_and(|m| m.starts_with("audio/")))
            .collect();
        let stream_url = best_url(&audio).or_else(|| best_url(&self.format_streams))?;
        Some(Resolved {
            stream_url,
            title: self.title.unwrap_or_else(|| "Radio Play (Invidious)".to_string()),
            backend: "Invidious".to_string(),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
    title: Option<String>,
    #[serde(default)]
    audio_streams: Vec<Variant>,
}

impl PipedStreams {
    fn into_resolved(self) -> Option<Resolved> {
        let stream_url = best_url(&self.audio_streams)?;
        Some(Resolved {
            stream_url,
            title: self.title.unwrap_or_else(|| "Radio Play (Piped)".to_string()),
            backend: "Piped".to_string(),
        })
    }
}

async fn fetch_json<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> Result<T, ResolveError> {
    let resp = http.get(url).timeout(API_TIMEOUT).send().await?;
    if !resp.status().is_success() {
        return Err(ResolveError::Status(resp.status()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

pub struct Invidious {
    http: reqwest::Client,
    instances: Vec<String>,
}

impl Invidious {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_instances(http, INVIDIOUS_INSTANCES.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_instances(http: reqwest::Client, instances: Vec<String>) -> Self {
        Self { http, instances }
    }
}

#[async_trait]
impl Backend for Invidious {
    fn name(&self) -> &str {
        "Invidious"
    }

    async fn resolve(&self, reference: &str) -> Result<Resolved, ResolveError> {
        let id = extract_video_id(reference).ok_or(ResolveError::NotApplicable)?;
        let mut last_err = ResolveError::NoStream;

        for base in &self.instances {
            debug!("Invidious: {base}");
            let url = format!("{base}/api/v1/videos/{id}");
            match fetch_json::<InvidiousVideo>(&self.http, &url).await {
                Ok(video) => match video.into_resolved() {
                    Some(resolved) => return Ok(resolved),
                    None => last_err = ResolveError::NoStream,
                },
                Err(e) => {
                    debug!("Invidious {base}: {e}");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

pub struct Piped {
    http: reqwest::Client,
    instances: Vec<String>,
}

impl Piped {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_instances(http, PIPED_INSTANCES.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_instances(http: reqwest::Client, instances: Vec<String>) -> Self {
        Self { http, instances }
    }
}

#[async_trait]
impl Backend for Piped {
    fn name(&self) -> &str {
        "Piped"
    }

    async fn resolve(&self, reference: &str) -> Result<Resolved, ResolveError> {
        let id = extract_video_id(reference).ok_or(ResolveError::NotApplicable)?;
        let mut last_err = ResolveError::NoStream;

        for base in &self.instances {
            debug!("Piped: {base}");
            let url = format!("{base}/streams/{id}");
            match fetch_json::<PipedStreams>(&self.http, &url).await {
                Ok(streams) => match streams.into_resolved() {
                    Some(resolved) => return Ok(resolved),
                    None => last_err = ResolveError::NoStream,
                },
                Err(e) => {
                    debug!("Piped {base}: {e}");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invidious_prefers_audio_adaptive_formats() {
        let video: InvidiousVideo = serde_json::from_str(
            r#"{
                "title": "Du Hast",
                "adaptiveFormats": [
                    {"url": "https://v/1", "type": "video/mp4", "bitrate": "900000"},
                    {"url": "https://a/1", "type": "audio/mp4; codecs=\"mp4a.40.2\"", "bitrate": "128000"},
                    {"url": "https://a/2", "type": "audio/webm; codecs=\"opus\"", "bitrate": "160000"}
                ],
                "formatStreams": [{"url": "https://f/1", "bitrate": "500000"}]
            }"#,
        )
        .unwrap();
        let resolved = video.into_resolved().unwrap();
        assert_eq!(resolved.stream_url, "https://a/2");
        assert_eq!(resolved.title, "Du Hast");
    }

    #[test]
    fn test_invidious_falls_back_to_format_streams() {
        let video: InvidiousVideo = serde_json::from_str(
            r#"{"formatStreams": [{"url": "https://f/1"}, {"url": "https://f/2", "bitrate": "2"}]}"#,
        )
        .unwrap();
        let resolved = video.into_resolved().unwrap();
        assert_eq!(resolved.stream_url, "https://f/2");
        assert_eq!(resolved.title, "Radio Play (Invidious)");
    }

    #[test]
    fn test_piped_equal_bitrates_keep_list_order() {
        let streams: PipedStreams = serde_json::from_str(
            r#"{"audioStreams": [
                {"url": "https://p/1", "bitrate": 64000},
                {"url": "https://p/2", "bitrate": 128000},
                {"url": "https://p/3", "bitrate": 128000}
            ]}"#,
        )
        .unwrap();
        assert_eq!(streams.into_resolved().unwrap().stream_url, "https://p/2");
    }

    #[test]
    fn test_piped_without_audio() {
        let streams: PipedStreams = serde_json::from_str(r#"{"audioStreams": []}"#).unwrap();
        assert!(streams.into_resolved().is_none());
    }

    #[tokio::test]
    async fn test_search_query_not_applicable() {
        let piped = Piped::with_instances(reqwest::Client::new(), vec![]);
        assert!(matches!(
            piped.resolve("rammstein sonne").await,
            Err(ResolveError::NotApplicable)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_instances_fail() {
        let invidious =
            Invidious::with_instances(reqwest::Client::new(), vec!["http://127.0.0.1:9".into()]);
        assert!(invidious
            .resolve("https://youtu.be/dQw4w9WgXcQ")
            .await
            .is_err());
    }
}
