//! Turns a playlist reference into a playable stream URL.
//!
//! Backends are tried in a fixed order and the first success wins. Failures
//! are logged and swallowed; running out of backends yields `None`, which the
//! player treats as a skip.

pub mod cobalt;
pub mod mirrors;
pub mod ytdlp;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Per-request bound for remote resolver APIs.
pub const API_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub stream_url: String,
    pub title: String,
    pub backend: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("not applicable to this reference")]
    NotApplicable,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no audio stream in response")]
    NoStream,
    #[error("extractor failed: {0}")]
    Extractor(String),
    #[error("extractor timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, reference: &str) -> Result<Resolved, ResolveError>;
}

pub struct StreamResolver {
    backends: Vec<Box<dyn Backend>>,
}

impl StreamResolver {
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// Cobalt, Invidious, Piped, then yt-dlp (direct, then once per proxy).
    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        cookies: Option<std::path::PathBuf>,
    ) -> Self {
        let mut backends: Vec<Box<dyn Backend>> = vec![
            Box::new(cobalt::Cobalt::new(http.clone(), config.cobalt_url.clone())),
            Box::new(mirrors::Invidious::new(http.clone())),
            Box::new(mirrors::Piped::new(http)),
            Box::new(ytdlp::YtDlp::new(cookies.clone(), None)),
        ];
        for proxy in &config.proxies {
            backends.push(Box::new(ytdlp::YtDlp::new(cookies.clone(), Some(proxy.clone()))));
        }
        Self::new(backends)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn resolve(&self, reference: &str) -> Option<Resolved> {
        for backend in &self.backends {
            match backend.resolve(reference).await {
                Ok(resolved) => {
                    info!("resolved '{reference}' via {}", backend.name());
                    return Some(resolved);
                }
                Err(ResolveError::NotApplicable) => {
                    debug!("{} skipped for '{reference}'", backend.name());
                }
                Err(e) => warn!("{} failed for '{reference}': {e}", backend.name()),
            }
        }
        warn!("all backends failed for '{reference}'");
        None
    }
}

pub fn is_youtube_url(reference: &str) -> bool {
    reference.contains("youtube.com") || reference.contains("youtu.be")
}

/// `watch?v=ID` (up to `&`) or `youtu.be/ID` (up to `?`).
pub fn extract_video_id(reference: &str) -> Option<&str> {
    let id = if let Some((_, rest)) = reference.split_once("v=") {
        rest.split('&').next()
    } else if let Some((_, rest)) = reference.split_once("youtu.be/") {
        rest.split('?').next()
    } else {
        None
    }?;
    (!id.is_empty()).then_some(id)
}

/// Highest bitrate wins; among equal bitrates the earliest in list order.
pub fn pick_highest_bitrate<T>(variants: &[T], bitrate: impl Fn(&T) -> u64) -> Option<&T> {
    variants.iter().fold(None, |best: Option<&T>, v| match best {
        Some(b) if bitrate(b) >= bitrate(v) => Some(b),
        _ => Some(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("rammstein du hast"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
    }

    #[test]
    fn test_is_youtube_url() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=x"));
        assert!(is_youtube_url("https://youtu.be/x"));
        assert!(!is_youtube_url("https://soundcloud.com/x"));
    }

    #[test]
    fn test_highest_bitrate_keeps_first_of_equals() {
        let variants = [("a", 128), ("b", 160), ("c", 160), ("d", 64)];
        let best = pick_highest_bitrate(&variants, |v| v.1).unwrap();
        assert_eq!(best.0, "b");
        assert!(pick_highest_bitrate(&[] as &[(&str, u64)], |v| v.1).is_none());
    }
}
