use std::path::{Path, PathBuf};
use std::time::Duration;

use serenity::model::id::ChannelId;

pub const UNKNOWN_TRACK_TITLE: &str = "UNKNOWN TRACK";

/// A resolved, playable track.
///
/// `locator` is the page the track was resolved from, not a stream: every play opens a
/// fresh stream from it, since extracted stream URLs expire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub locator: String,
    pub origin: ChannelId,
    pub duration: Option<Duration>,
}

impl Track {
    /// Title with the duration appended when known, e.g. `Song (3:07)`.
    pub fn display(&self) -> String {
        match self.duration {
            Some(duration) => format!("{} ({})", self.title, format_duration(duration)),
            None => self.title.clone(),
        }
    }
}

/// What a voice connection is asked to stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Remote(String),
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundEffect {
    Heartsteel,
    Viktor,
}

impl SoundEffect {
    pub fn file_name(self) -> &'static str {
        match self {
            SoundEffect::Heartsteel => "heartsteel.mp3",
            SoundEffect::Viktor => "viktor.mp3",
        }
    }

    pub fn announcement(self) -> &'static str {
        match self {
            SoundEffect::Heartsteel => "PLUS 1 HEARTSTEEL STACK!",
            SoundEffect::Viktor => "VIK TOR VIKTOOORRRRR",
        }
    }

    pub fn path_in(self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(self.file_name())
    }
}

pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let display_seconds = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:0>2}:{display_seconds:0>2}")
    } else {
        format!("{minutes}:{display_seconds:0>2}")
    }
}
