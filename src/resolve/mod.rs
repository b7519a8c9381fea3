//! Turning user queries into playable tracks.

mod spotify;
mod youtube;

use serenity::async_trait;
use serenity::model::id::ChannelId;
use tracing::{info, warn};
use url::{ParseError, Url};

use crate::config::SpotifyCredentials;
use crate::error::PlaybackError;
use crate::models::Track;

use spotify::{SpotifyClient, SpotifyRef};
use youtube::YtDlp;

/// The tracks a query resolved to. `playlist` is set when the query named a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub playlist: Option<String>,
    pub tracks: Vec<Track>,
}

#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `query`; the returned tracks report back to `origin`. Never returns an
    /// empty track list: that is [`PlaybackError::NotFound`].
    async fn resolve(&self, query: &str, origin: ChannelId) -> Result<Resolution, PlaybackError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// A link yt-dlp can extract directly.
    Url(String),
    Spotify(SpotifyRef),
    /// A Spotify link to something other than a track, album or playlist.
    Unsupported(String),
    Search(String),
}

impl Query {
    pub fn parse(input: &str) -> Query {
        let input = input.trim();

        if let Some(reference) = SpotifyRef::from_uri(input) {
            return Query::Spotify(reference);
        }

        match parse_link(input) {
            Some(url) if spotify::is_spotify_host(url.host_str()) => {
                match SpotifyRef::from_url(&url) {
                    Some(reference) => Query::Spotify(reference),
                    None => Query::Unsupported(input.to_string()),
                }
            }
            Some(url) => Query::Url(url.into()),
            None => Query::Search(input.to_string()),
        }
    }
}

/// Parses `input` as an http(s) link. Links pasted without a scheme, like
/// `youtu.be/dQw4w9WgXcQ`, are read as https when their first segment looks like a host.
fn parse_link(input: &str) -> Option<Url> {
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) if looks_like_host(input) => {
            Url::parse(&format!("https://{input}")).ok()?
        }
        Err(_) => return None,
    };

    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn looks_like_host(input: &str) -> bool {
    let host = input.split(['/', '?', '#']).next().unwrap_or_default();

    !input.contains(char::is_whitespace)
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
}

pub struct TrackResolver {
    ytdlp: YtDlp,
    spotify: Option<SpotifyClient>,
    playlist_limit: usize,
}

impl TrackResolver {
    pub fn new(spotify: Option<SpotifyCredentials>, playlist_limit: usize) -> Self {
        TrackResolver {
            ytdlp: YtDlp::default(),
            spotify: spotify.map(SpotifyClient::new),
            playlist_limit,
        }
    }

    async fn resolve_url(&self, url: &str, origin: ChannelId) -> Result<Resolution, PlaybackError> {
        let entries = self.ytdlp.extract(url, self.playlist_limit).await?;

        if entries.is_empty() {
            return Err(PlaybackError::NotFound(url.to_string()));
        }

        let playlist = entries.first().and_then(|entry| entry.playlist_title.clone());
        let tracks = entries
            .into_iter()
            .map(|entry| entry.into_track(origin))
            .collect();

        Ok(Resolution { playlist, tracks })
    }

    async fn resolve_search(
        &self,
        text: &str,
        origin: ChannelId,
    ) -> Result<Resolution, PlaybackError> {
        let entry = self
            .ytdlp
            .search(text)
            .await?
            .ok_or_else(|| PlaybackError::NotFound(text.to_string()))?;

        Ok(Resolution {
            playlist: None,
            tracks: vec![entry.into_track(origin)],
        })
    }

    async fn resolve_spotify(
        &self,
        reference: &SpotifyRef,
        origin: ChannelId,
    ) -> Result<Resolution, PlaybackError> {
        let spotify = self.spotify.as_ref().ok_or_else(|| {
            PlaybackError::Resolution("Spotify links are not enabled on this bot".to_string())
        })?;

        let listing = spotify.listing(reference, self.playlist_limit).await?;
        info!(
            kind = ?reference.kind,
            count = listing.queries.len(),
            "Resolving Spotify listing on YouTube"
        );

        let mut tracks = Vec::with_capacity(listing.queries.len());
        for query in &listing.queries {
            match self.ytdlp.search(query).await {
                Ok(Some(entry)) => tracks.push(entry.into_track(origin)),
                Ok(None) => warn!("No YouTube result for {query}"),
                Err(why) => warn!("Search for {query} failed: {why}"),
            }
        }

        if tracks.is_empty() {
            return Err(PlaybackError::NotFound(reference.to_string()));
        }

        Ok(Resolution {
            playlist: listing.name,
            tracks,
        })
    }
}

#[async_trait]
impl Resolve for TrackResolver {
    async fn resolve(&self, query: &str, origin: ChannelId) -> Result<Resolution, PlaybackError> {
        match Query::parse(query) {
            Query::Url(url) => self.resolve_url(&url, origin).await,
            Query::Spotify(reference) => self.resolve_spotify(&reference, origin).await,
            Query::Search(text) => self.resolve_search(&text, origin).await,
            Query::Unsupported(link) => Err(PlaybackError::Resolution(format!(
                "only Spotify tracks, albums and playlists are supported, not {link}"
            ))),
        }
    }
}
