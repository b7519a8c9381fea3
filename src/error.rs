use std::path::PathBuf;

use thiserror::Error;

/// Everything a playback command can fail with.
///
/// Every variant is caught by the framework's `after` hook and turned into a chat message,
/// see [`PlaybackError::user_message`].
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no results found for `{0}`")]
    NotFound(String),
    #[error("could not resolve query: {0}")]
    Resolution(String),
    #[error("not connected to a voice channel")]
    NotConnected,
    #[error("invoking user is not in a voice channel")]
    UserNotInVoice,
    #[error("nothing is playing")]
    NothingPlaying,
    #[error("nothing is paused")]
    NothingPaused,
    #[error("queue is empty")]
    QueueEmpty,
    #[error("audio output is busy")]
    Busy,
    #[error("asset `{}` is missing", .0.display())]
    MissingAsset(PathBuf),
    #[error("voice transport failed: {0}")]
    Transport(String),
}

impl PlaybackError {
    /// Text posted back to the channel the command came from.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::NotFound(_) => "No results found. Please try another query.".to_string(),
            PlaybackError::Resolution(reason) => format!("Could not load that: {reason}"),
            PlaybackError::NotConnected => "The bot is not in a voice channel.".to_string(),
            PlaybackError::UserNotInVoice => {
                "You need to be in a voice channel to use this command.".to_string()
            }
            PlaybackError::NothingPlaying => "No music is currently playing.".to_string(),
            PlaybackError::NothingPaused => "No music is currently paused.".to_string(),
            PlaybackError::QueueEmpty => "The queue is empty.".to_string(),
            PlaybackError::Busy => "❌ Cannot play sounds while music is playing.".to_string(),
            PlaybackError::MissingAsset(path) => {
                format!("❌ The file `{}` could not be found.", path.display())
            }
            PlaybackError::Transport(_) => "An error occurred. Please try again.".to_string(),
        }
    }
}

impl From<songbird::error::JoinError> for PlaybackError {
    fn from(error: songbird::error::JoinError) -> Self {
        PlaybackError::Transport(error.to_string())
    }
}

impl From<songbird::input::error::Error> for PlaybackError {
    fn from(error: songbird::input::error::Error) -> Self {
        PlaybackError::Transport(error.to_string())
    }
}

impl From<songbird::tracks::TrackError> for PlaybackError {
    fn from(error: songbird::tracks::TrackError) -> Self {
        PlaybackError::Transport(error.to_string())
    }
}
