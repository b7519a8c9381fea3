//! Songbird-backed voice connections.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::tracks::TrackHandle;
use songbird::{
    ffmpeg, ytdl, Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird,
    TrackEvent,
};
use tokio::sync::Mutex;
use tracing::info;

use super::{TrackEndNotifier, VoiceConnection, VoiceConnector};
use crate::error::PlaybackError;
use crate::models::Source;

pub struct SongbirdConnector {
    songbird: Arc<Songbird>,
}

impl SongbirdConnector {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        SongbirdConnector { songbird }
    }
}

#[async_trait]
impl VoiceConnector for SongbirdConnector {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnection>, PlaybackError> {
        let (call, joined) = self.songbird.join(guild_id, channel_id).await;
        joined?;

        {
            let mut handler = call.lock().await;

            if handler.is_deaf() {
                info!("Already deafen!")
            } else if let Err(e) = handler.deafen(true).await {
                info!("Deafen failed due to {e:?}")
            }
        }

        Ok(Box::new(SongbirdConnection {
            songbird: self.songbird.clone(),
            guild_id,
            call,
            track_handle: None,
        }))
    }
}

struct SongbirdConnection {
    songbird: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    track_handle: Option<TrackHandle>,
}

impl SongbirdConnection {
    fn current(&self) -> Result<&TrackHandle, PlaybackError> {
        self.track_handle.as_ref().ok_or(PlaybackError::NothingPlaying)
    }
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn play(
        &mut self,
        source: &Source,
        notifier: TrackEndNotifier,
    ) -> Result<(), PlaybackError> {
        let input = match source {
            Source::Remote(url) => ytdl(url).await?,
            Source::File(path) => ffmpeg(path).await?,
        };

        let mut handler = self.call.lock().await;

        handler.stop(); // Just in case something was playing before
        let track_handle = handler.play_source(input);
        track_handle.add_event(Event::Track(TrackEvent::End), SongEndNotifier { notifier })?;

        self.track_handle = Some(track_handle);

        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.current()?.pause()?;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        self.current()?.play()?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(track_handle) = self.track_handle.take() {
            if let Err(why) = track_handle.stop() {
                info!("Track already finished: {why:?}");
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), PlaybackError> {
        self.stop();
        self.songbird.remove(self.guild_id).await?;
        Ok(())
    }
}

struct SongEndNotifier {
    notifier: TrackEndNotifier,
}

#[async_trait]
impl VoiceEventHandler for SongEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        info!("End notifier triggered");

        self.notifier.notify();

        None
    }
}
