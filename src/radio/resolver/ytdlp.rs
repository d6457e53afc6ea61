use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{Backend, ResolveError, Resolved};

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct YtDlpOutput {
    title: Option<String>,
    url: Option<String>,
}

/// Full local extractor: authenticated with the cookie file, posing as the
/// mobile clients and forced onto IPv4. One instance per proxy.
pub struct YtDlp {
    cookies: Option<PathBuf>,
    proxy: Option<String>,
    name: String,
}

impl YtDlp {
    pub fn new(cookies: Option<PathBuf>, proxy: Option<String>) -> Self {
        let name = match &proxy {
            Some(p) => format!("yt-dlp (proxy {p})"),
            None => "yt-dlp".to_string(),
        };
        Self { cookies, proxy, name }
    }

    pub fn args(&self, reference: &str) -> Vec<String> {
        let is_url = reference.starts_with("http://") || reference.starts_with("https://");
        let target = if is_url {
            reference.to_string()
        } else {
            format!("ytsearch1:{reference}")
        };

        let mut args: Vec<String> = [
            "-j",
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--force-ipv4",
            "--no-check-certificates",
            "--extractor-args",
            "youtube:player_client=android,ios",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(cookies) = &self.cookies {
            args.push("--cookies".into());
            args.push(cookies.display().to_string());
        }
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".into());
            args.push(proxy.clone());
        }
        args.push(target);
        args
    }
}

#[async_trait]
impl Backend for YtDlp {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, reference: &str) -> Result<Resolved, ResolveError> {
        let child = Command::new("yt-dlp")
            .args(self.args(reference))
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(EXTRACT_TIMEOUT, child)
            .await
            .map_err(|_| ResolveError::Timeout)??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Extractor(stderr.trim().to_string()));
        }

        parse_output(&output.stdout, &self.name)
    }
}

fn parse_output(stdout: &[u8], backend: &str) -> Result<Resolved, ResolveError> {
    // searches print one JSON document per line
    let first = stdout
        .split(|b| *b == b'\n')
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
        .ok_or(ResolveError::NoStream)?;
    let info: YtDlpOutput = serde_json::from_slice(first)?;

    Ok(Resolved {
        stream_url: info.url.ok_or(ResolveError::NoStream)?,
        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
        backend: backend.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_for_search_with_cookies_and_proxy() {
        let ytdlp = YtDlp::new(
            Some(PathBuf::from("/srv/cookies.txt")),
            Some("http://1.2.3.4:8080".into()),
        );
        let args = ytdlp.args("rammstein sonne");
        assert_eq!(args.last().unwrap(), "ytsearch1:rammstein sonne");
        assert!(args.windows(2).any(|w| w == ["--cookies", "/srv/cookies.txt"]));
        assert!(args.windows(2).any(|w| w == ["--proxy", "http://1.2.3.4:8080"]));
        assert!(args.contains(&"--force-ipv4".to_string()));
        assert_eq!(ytdlp.name(), "yt-dlp (proxy http://1.2.3.4:8080)");
    }

    #[test]
    fn test_args_for_url_without_extras() {
        let ytdlp = YtDlp::new(None, None);
        let args = ytdlp.args("https://youtu.be/abc");
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc");
        assert!(!args.contains(&"--cookies".to_string()));
        assert!(!args.contains(&"--proxy".to_string()));
    }

    #[test]
    fn test_parse_output() {
        let stdout = b"\n{\"title\": \"Sonne\", \"url\": \"https://rr1.example/audio\"}\n";
        let resolved = parse_output(stdout, "yt-dlp").unwrap();
        assert_eq!(resolved.title, "Sonne");
        assert_eq!(resolved.stream_url, "https://rr1.example/audio");
    }

    #[test]
    fn test_parse_output_without_url() {
        assert!(matches!(
            parse_output(b"{\"title\": \"x\"}", "yt-dlp"),
            Err(ResolveError::NoStream)
        ));
        assert!(matches!(parse_output(b"", "yt-dlp"), Err(ResolveError::NoStream)));
    }
}
