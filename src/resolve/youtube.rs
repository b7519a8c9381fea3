use std::time::Duration;

use serde::Deserialize;
use serenity::model::id::ChannelId;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::PlaybackError;
use crate::models::{Track, UNKNOWN_TRACK_TITLE};

const YTDLP: &str = "yt-dlp";
const UNAVAILABLE_TITLES: [&str; 2] = ["[Private video]", "[Deleted video]"];

/// One line of `yt-dlp -j --flat-playlist` output. Single videos carry `webpage_url`,
/// flat playlist and search entries only `url`.
#[derive(Deserialize)]
struct RawEntry {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    playlist_title: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
    pub playlist_title: Option<String>,
}

impl Entry {
    pub fn into_track(self, origin: ChannelId) -> Track {
        Track {
            title: self.title,
            locator: self.url,
            origin,
            duration: self.duration,
        }
    }
}

/// Metadata lookups through the `yt-dlp` executable.
#[derive(Default)]
pub struct YtDlp;

impl YtDlp {
    /// Extracts a single video or up to `limit` playlist entries from `url`.
    pub async fn extract(&self, url: &str, limit: usize) -> Result<Vec<Entry>, PlaybackError> {
        info!("Getting songs from {url}");

        let output = Command::new(YTDLP)
            .args(extract_args(url, limit))
            .output()
            .await
            .map_err(|why| PlaybackError::Resolution(format!("yt-dlp failed to start: {why}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or_default().trim();
            warn!("yt-dlp returned nothing for {url}: {reason}");

            return if output.status.success() {
                Ok(Vec::new())
            } else {
                Err(PlaybackError::Resolution(reason.to_string()))
            };
        }

        Ok(parse_entries(&stdout))
    }

    /// First YouTube search result for `query`, if any.
    pub async fn search(&self, query: &str) -> Result<Option<Entry>, PlaybackError> {
        let entries = self.extract(&format!("ytsearch1:{query}"), 1).await?;

        Ok(entries.into_iter().next())
    }
}

/// One JSON line per video, without resolving playlist entries further, stopping after
/// `limit` entries.
fn extract_args(url: &str, limit: usize) -> Vec<String> {
    vec![
        "-j".to_string(),
        "--flat-playlist".to_string(),
        "--playlist-end".to_string(),
        limit.to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

fn parse_entries(output: &str) -> Vec<Entry> {
    let lines: Vec<&str> = output.lines().filter(|line| !line.trim().is_empty()).collect();

    let entries: Vec<Entry> = lines
        .iter()
        .filter_map(|line| {
            let raw: RawEntry = serde_json::from_str(line).ok()?;

            let url = raw
                .webpage_url
                .or(raw.url)
                .filter(|url| url.starts_with("http"))?;

            let title = raw.title.unwrap_or_else(|| UNKNOWN_TRACK_TITLE.to_string());
            if UNAVAILABLE_TITLES.contains(&title.as_str()) {
                return None;
            }

            let duration = raw
                .duration
                .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
                .map(Duration::from_secs_f64);

            Some(Entry {
                title,
                url,
                duration,
                playlist_title: raw.playlist_title,
            })
        })
        .collect();

    if entries.len() < lines.len() {
        warn!(
            skipped = lines.len() - entries.len(),
            "Some songs have been skipped due to errors during parsing"
        );
    }

    entries
}
