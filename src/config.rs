use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{debug, info, warn};

const DEFAULT_CITIES: &str = "Berlin,Wiesbaden,Munchen,Hamburg,Palma de Mallorca";
const DEFAULT_NEWS_FEED: &str = "https://www.rbb24.de/aktuell/index.xml/feed=rss.xml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid broadcast time '{0}', expected HH:MM")]
    BroadcastTime(String),
    #[error("unknown time zone '{0}'")]
    TimeZone(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    pub admin_user: String,
    pub cookies_content: Option<String>,
    pub cookie_path: PathBuf,
    pub playlist_path: PathBuf,
    pub proxies: Vec<String>,
    pub cities: Vec<String>,
    pub news_feed: String,
    pub broadcast_file: PathBuf,
    pub broadcast_time: NaiveTime,
    pub broadcast_tz: Tz,
    pub tts_url: String,
    pub tts_voice: String,
    pub tts_api_key: Option<String>,
    pub tts_file: PathBuf,
    pub cobalt_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let raw_token =
            std::env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN environment variable is required");

        let broadcast_time = env_or("RADIO_BROADCAST_TIME", "00:00");
        let broadcast_time = parse_broadcast_time(&broadcast_time).unwrap_or_else(|e| {
            warn!("{e}; using 00:00");
            NaiveTime::MIN
        });

        let broadcast_tz = env_or("RADIO_BROADCAST_TZ", "Europe/Berlin");
        let broadcast_tz = parse_time_zone(&broadcast_tz).unwrap_or_else(|e| {
            warn!("{e}; using Europe/Berlin");
            chrono_tz::Europe::Berlin
        });

        Self {
            discord_token: clean_token(&raw_token),
            prefix: env_or("RADIO_PREFIX", ":"),
            admin_user: env_or("RADIO_ADMIN", "arnaupq"),
            cookies_content: std::env::var("COOKIES_CONTENT")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            cookie_path: env_or("RADIO_COOKIE_PATH", "cookies.txt").into(),
            playlist_path: env_or("RADIO_PLAYLIST_PATH", "lista_canciones.txt").into(),
            proxies: split_list(&std::env::var("RADIO_PROXIES").unwrap_or_default()),
            cities: split_list(&env_or("RADIO_CITIES", DEFAULT_CITIES)),
            news_feed: env_or("RADIO_NEWS_FEED", DEFAULT_NEWS_FEED),
            broadcast_file: env_or("RADIO_BROADCAST_FILE", "deutschland.m4a").into(),
            broadcast_time,
            broadcast_tz,
            tts_url: env_or("RADIO_TTS_URL", "http://localhost:5050/v1/audio/speech"),
            tts_voice: env_or("RADIO_TTS_VOICE", "de-DE-ConradNeural"),
            tts_api_key: std::env::var("RADIO_TTS_API_KEY").ok(),
            tts_file: env_or("RADIO_TTS_FILE", "tts_temp.mp3").into(),
            cobalt_url: env_or("RADIO_COBALT_URL", "https://api.cobalt.tools/api/json"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Comma separated list, blanks dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Strips whitespace and stray quotes that commonly sneak into `.env` tokens.
pub fn clean_token(raw: &str) -> String {
    let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.len() != raw.len() {
        warn!("DISCORD_TOKEN contained surrounding whitespace or quotes; stripped");
    }
    if cleaned.chars().any(char::is_whitespace) {
        warn!("DISCORD_TOKEN contains inner whitespace and will likely be rejected");
    }
    cleaned.to_string()
}

pub fn parse_broadcast_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ConfigError::BroadcastTime(raw.to_string()))
}

pub fn parse_time_zone(raw: &str) -> Result<Tz, ConfigError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::TimeZone(raw.to_string()))
}

/// Makes the extractor cookie file available. Returns the path when one exists.
pub fn prepare_cookies(content: Option<&str>, path: &Path) -> Option<PathBuf> {
    if let Some(content) = content {
        match std::fs::write(path, content) {
            Ok(()) => info!("cookie file written from COOKIES_CONTENT"),
            Err(e) => {
                warn!("could not write cookie file {}: {e}", path.display());
                return None;
            }
        }
    } else if path.exists() {
        info!("using existing cookie file {}", path.display());
    } else {
        warn!("no cookie file found; extractor runs unauthenticated");
        return None;
    }

    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if let Ok(meta) = std::fs::metadata(&absolute) {
        debug!("cookie file {} ({} bytes)", absolute.display(), meta.len());
    }
    Some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" Berlin, ,Hamburg ,Palma de Mallorca,"),
            vec!["Berlin", "Hamburg", "Palma de Mallorca"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_clean_token_strips_quotes() {
        assert_eq!(clean_token("  \"abc.def\"\n"), "abc.def");
        assert_eq!(clean_token("abc"), "abc");
    }

    #[test]
    fn test_broadcast_time_parsing() {
        assert_eq!(
            parse_broadcast_time("00:00").unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_broadcast_time("18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert!(parse_broadcast_time("25:00").is_err());
    }

    #[test]
    fn test_time_zone_parsing() {
        assert_eq!(parse_time_zone("Europe/Berlin").unwrap(), chrono_tz::Europe::Berlin);
        assert!(parse_time_zone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_prepare_cookies_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        let resolved = prepare_cookies(Some("# Netscape HTTP Cookie File\n"), &path).unwrap();
        assert!(resolved.ends_with("cookies.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# Netscape HTTP Cookie File\n"
        );
    }

    #[test]
    fn test_prepare_cookies_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(prepare_cookies(None, &dir.path().join("cookies.txt")).is_none());
    }
}
