//! Spotify Web API lookups. Spotify links are never streamed; their tracks are turned into
//! `"title by artist"` strings and searched on YouTube.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::SpotifyCredentials;
use crate::error::PlaybackError;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
// refresh a little before Spotify says the token expires
const TOKEN_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpotifyKind {
    Track,
    Album,
    Playlist,
}

impl SpotifyKind {
    fn from_segment(segment: &str) -> Option<SpotifyKind> {
        match segment {
            "track" => Some(SpotifyKind::Track),
            "album" => Some(SpotifyKind::Album),
            "playlist" => Some(SpotifyKind::Playlist),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotifyRef {
    pub kind: SpotifyKind,
    pub id: String,
}

impl SpotifyRef {
    /// Parses `spotify:<kind>:<id>` URIs.
    pub fn from_uri(input: &str) -> Option<SpotifyRef> {
        let mut parts = input.strip_prefix("spotify:")?.split(':');
        let kind = SpotifyKind::from_segment(parts.next()?)?;
        let id = parts.next().filter(|id| is_valid_id(id))?;

        Some(SpotifyRef {
            kind,
            id: id.to_string(),
        })
    }

    /// Parses `open.spotify.com` links, including localised (`/intl-xx/`) and embed paths.
    pub fn from_url(url: &Url) -> Option<SpotifyRef> {
        let segments: Vec<&str> = url.path_segments()?.collect();

        segments.windows(2).find_map(|pair| {
            let kind = SpotifyKind::from_segment(pair[0])?;
            is_valid_id(pair[1]).then(|| SpotifyRef {
                kind,
                id: pair[1].to_string(),
            })
        })
    }
}

impl fmt::Display for SpotifyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SpotifyKind::Track => "track",
            SpotifyKind::Album => "album",
            SpotifyKind::Playlist => "playlist",
        };

        write!(f, "spotify:{kind}:{}", self.id)
    }
}

pub(super) fn is_spotify_host(host: Option<&str>) -> bool {
    matches!(host, Some("open.spotify.com") | Some("spotify.com") | Some("www.spotify.com"))
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
}

impl SpotifyTrack {
    fn search_query(&self) -> String {
        let artists: Vec<&str> = self.artists.iter().map(|artist| artist.name.as_str()).collect();

        if artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} by {}", self.name, artists.join(", "))
        }
    }
}

#[derive(Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct Album {
    name: String,
    tracks: Page<SpotifyTrack>,
}

#[derive(Deserialize)]
struct Playlist {
    name: String,
    tracks: Page<PlaylistItem>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

impl PlaylistItem {
    fn into_track(self) -> Option<SpotifyTrack> {
        self.track
    }
}

/// Search strings for everything a Spotify link points at.
#[derive(Debug, PartialEq, Eq)]
pub struct SpotifyListing {
    /// Album or playlist name; `None` for single tracks.
    pub name: Option<String>,
    pub queries: Vec<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    http: Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials) -> Self {
        SpotifyClient {
            http: Client::new(),
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Lists up to `limit` `"title by artist"` search strings for `reference`.
    pub async fn listing(
        &self,
        reference: &SpotifyRef,
        limit: usize,
    ) -> Result<SpotifyListing, PlaybackError> {
        info!("Getting songs from {reference}");

        match reference.kind {
            SpotifyKind::Track => {
                let track: SpotifyTrack = self
                    .get(&format!("{API_BASE}/tracks/{}", reference.id))
                    .await?;

                Ok(SpotifyListing {
                    name: None,
                    queries: vec![track.search_query()],
                })
            }
            SpotifyKind::Album => {
                let album: Album = self
                    .get(&format!("{API_BASE}/albums/{}", reference.id))
                    .await?;
                let queries = self.collect(album.tracks, limit, Some).await?;

                Ok(SpotifyListing {
                    name: Some(album.name),
                    queries,
                })
            }
            SpotifyKind::Playlist => {
                let playlist: Playlist = self
                    .get(&format!("{API_BASE}/playlists/{}", reference.id))
                    .await?;
                let queries = self
                    .collect(playlist.tracks, limit, PlaylistItem::into_track)
                    .await?;

                Ok(SpotifyListing {
                    name: Some(playlist.name),
                    queries,
                })
            }
        }
    }

    /// Walks a paged track list until `limit` search strings are gathered.
    async fn collect<T, F>(
        &self,
        first: Page<T>,
        limit: usize,
        track_of: F,
    ) -> Result<Vec<String>, PlaybackError>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Option<SpotifyTrack>,
    {
        let mut queries = Vec::new();
        let mut page = first;

        loop {
            queries.extend(
                page.items
                    .into_iter()
                    .filter_map(&track_of)
                    .map(|track| track.search_query()),
            );

            match page.next {
                Some(next) if queries.len() < limit => page = self.get(&next).await?,
                _ => break,
            }
        }

        queries.truncate(limit);
        Ok(queries)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, PlaybackError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_failed)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlaybackError::NotFound(url.to_string()));
        }

        response
            .error_for_status()
            .map_err(request_failed)?
            .json()
            .await
            .map_err(request_failed)
    }

    async fn access_token(&self) -> Result<String, PlaybackError> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref() {
            if Instant::now() < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(request_failed)?
            .json()
            .await
            .map_err(request_failed)?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_MARGIN);
        let value = response.access_token;
        *token = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }
}

fn request_failed(why: reqwest::Error) -> PlaybackError {
    PlaybackError::Resolution(format!("Spotify request failed: {why}"))
}
