use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_PREFIX: &str = "?";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_PLAYLIST_LIMIT: usize = 100;
const DEFAULT_ASSETS_DIR: &str = "assets";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Expected a token in the environment (DISCORD_TOKEN)")]
    MissingToken,
    #[error("Invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set together")]
    PartialSpotifyCredentials,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub prefix: String,
    pub page_size: usize,
    pub playlist_limit: usize,
    pub assets_dir: PathBuf,
    pub spotify: Option<SpotifyCredentials>,
}

impl Config {
    /// Reads the configuration from the process environment. Call `dotenvy::dotenv()` first
    /// so a `.env` file is taken into account.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = get("DISCORD_TOKEN").ok_or(ConfigError::MissingToken)?;
        let prefix = get("BOT_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let page_size = positive("QUEUE_PAGE_SIZE", get("QUEUE_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        let playlist_limit =
            positive("PLAYLIST_LIMIT", get("PLAYLIST_LIMIT"), DEFAULT_PLAYLIST_LIMIT)?;
        let assets_dir = get("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));

        let spotify = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialSpotifyCredentials),
        };

        Ok(Config {
            token,
            prefix,
            page_size,
            playlist_limit,
            assets_dir,
            spotify,
        })
    }
}

fn positive(key: &'static str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match usize::from_str(raw.trim()) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.prefix, "?");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.playlist_limit, 100);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.spotify, None);
    }

    #[test]
    fn token_is_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])),
            Err(ConfigError::MissingToken)
        );
    }

    #[test]
    fn page_size_must_be_positive() {
        let result = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("QUEUE_PAGE_SIZE", "0"),
        ]));

        assert_eq!(
            result,
            Err(ConfigError::Invalid {
                key: "QUEUE_PAGE_SIZE",
                value: "0".to_string()
            })
        );
    }

    #[test]
    fn spotify_credentials_come_in_pairs() {
        let partial = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SPOTIFY_CLIENT_ID", "id"),
        ]));
        assert_eq!(partial, Err(ConfigError::PartialSpotifyCredentials));

        let full = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("BOT_PREFIX", "!"),
        ]))
        .unwrap();
        assert_eq!(full.prefix, "!");
        assert_eq!(
            full.spotify,
            Some(SpotifyCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string()
            })
        );
    }
}
