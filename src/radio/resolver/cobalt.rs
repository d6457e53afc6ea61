use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{is_youtube_url, Backend, ResolveError, Resolved, API_TIMEOUT};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    url: &'a str,
    is_audio_only: bool,
}

#[derive(Deserialize)]
struct Response {
    url: Option<String>,
    picker: Option<Vec<PickerItem>>,
}

#[derive(Deserialize)]
struct PickerItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

impl Response {
    /// A direct link, or the audio entry of a multi-choice answer.
    fn into_stream_url(self) -> Option<String> {
        if let Some(url) = self.url {
            return Some(url);
        }
        self.picker?
            .into_iter()
            .find(|item| item.kind.as_deref() == Some("audio"))
            .and_then(|item| item.url)
    }
}

/// Download-link aggregator. Only asked about YouTube links.
pub struct Cobalt {
    http: reqwest::Client,
    api_url: String,
}

impl Cobalt {
    pub fn new(http: reqwest::Client, api_url: String) -> Self {
        Self { http, api_url }
    }
}

#[async_trait]
impl Backend for Cobalt {
    fn name(&self) -> &str {
        "Cobalt"
    }

    async fn resolve(&self, reference: &str) -> Result<Resolved, ResolveError> {
        if !is_youtube_url(reference) {
            return Err(ResolveError::NotApplicable);
        }

        let resp = self
            .http
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&Request {
                url: reference,
                is_audio_only: true,
            })
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ResolveError::Status(resp.status()));
        }

        let body = resp.bytes().await?;
        let stream_url = parse_response(&body)?;

        Ok(Resolved {
            stream_url,
            title: "Radio Play (Cobalt)".to_string(),
            backend: self.name().to_string(),
        })
    }
}

fn parse_response(body: &[u8]) -> Result<String, ResolveError> {
    let response: Response = serde_json::from_slice(body)?;
    response.into_stream_url().ok_or(ResolveError::NoStream)
}
