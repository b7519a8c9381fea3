use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn};
use tracing_futures::Instrument;

use super::{
    Enqueued, GuildHandle, GuildMessage, GuildSnapshot, QueueListing, Skipped, StatusSink,
    TrackEndNotifier, VoiceConnection, VoiceConnector,
};
use crate::error::PlaybackError;
use crate::models::{Source, Track};
use crate::pagination::QueuePage;

/// What the guild's connection is outputting right now.
#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Idle,
    Track {
        track: Track,
        paused: bool,
    },
    Effect,
}

#[derive(Default)]
pub struct GuildPlaybackState {
    pub queue: VecDeque<Track>,
    pub loop_current: bool,
    pub slot: Slot,
    connection: Option<Box<dyn VoiceConnection>>,
    // bumped whenever a stream starts or is cut off; older track-end events are stale
    generation: u64,
}

impl GuildPlaybackState {
    pub fn is_busy(&self) -> bool {
        !matches!(self.slot, Slot::Idle)
    }

    pub fn current(&self) -> Option<&Track> {
        match &self.slot {
            Slot::Track { track, .. } => Some(track),
            _ => None,
        }
    }

    /// Picks the track to play next. With `honour_loop` and looping on, the current track
    /// is replayed and the queue is left alone; otherwise the head is popped.
    fn next_track(&mut self, honour_loop: bool) -> Option<Track> {
        if honour_loop && self.loop_current {
            if let Some(track) = self.current() {
                return Some(track.clone());
            }
        }

        self.queue.pop_front()
    }

    fn snapshot(&self) -> GuildSnapshot {
        GuildSnapshot {
            now_playing: self.current().cloned(),
            paused: matches!(self.slot, Slot::Track { paused: true, .. }),
            effect: matches!(self.slot, Slot::Effect),
            queued: self.queue.iter().cloned().collect(),
            loop_current: self.loop_current,
            connected: self.connection.is_some(),
        }
    }
}

pub(super) struct GuildPlayer {
    guild_id: GuildId,
    state: GuildPlaybackState,
    connector: Arc<dyn VoiceConnector>,
    status: Arc<dyn StatusSink>,
    sender: GuildHandle,
}

impl GuildPlayer {
    pub(super) fn spawn(
        guild_id: GuildId,
        connector: Arc<dyn VoiceConnector>,
        status: Arc<dyn StatusSink>,
    ) -> GuildHandle {
        let (sender, receiver) = mpsc::unbounded_channel();

        let player = GuildPlayer {
            guild_id,
            state: GuildPlaybackState::default(),
            connector,
            status,
            sender: sender.clone(),
        };

        tokio::spawn(
            player
                .run(receiver)
                .instrument(info_span!("guild", id = guild_id.0)),
        );

        sender
    }

    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<GuildMessage>) {
        debug!("Guild player started");

        while let Some(message) = receiver.recv().await {
            match message {
                GuildMessage::Enqueue {
                    voice_channel,
                    tracks,
                    reply,
                } => {
                    let _ = reply.send(self.enqueue(voice_channel, tracks).await);
                }
                GuildMessage::PlayEffect {
                    voice_channel,
                    path,
                    reply,
                } => {
                    let _ = reply.send(self.play_effect(voice_channel, path).await);
                }
                GuildMessage::Pause { reply } => {
                    let _ = reply.send(self.pause());
                }
                GuildMessage::Resume { reply } => {
                    let _ = reply.send(self.resume());
                }
                GuildMessage::Stop { reply } => {
                    let _ = reply.send(self.stop());
                }
                GuildMessage::Skip { reply } => {
                    let _ = reply.send(self.skip().await);
                }
                GuildMessage::Shuffle { reply } => {
                    let _ = reply.send(self.shuffle());
                }
                GuildMessage::ToggleLoop { reply } => {
                    self.state.loop_current = !self.state.loop_current;
                    info!(loop_current = self.state.loop_current, "Loop toggled");
                    let _ = reply.send(Ok(self.state.loop_current));
                }
                GuildMessage::ListQueue {
                    page,
                    page_size,
                    reply,
                } => {
                    let _ = reply.send(Ok(self.list_queue(page, page_size)));
                }
                GuildMessage::Snapshot { reply } => {
                    let _ = reply.send(Ok(self.state.snapshot()));
                }
                GuildMessage::Disconnect { force, reply } => {
                    let result = self.disconnect().await;
                    let close = force || result.is_ok();
                    let _ = reply.send(result);

                    if close {
                        break;
                    }
                }
                GuildMessage::TrackEnded { generation } => self.track_ended(generation).await,
            }
        }

        debug!("Guild player stopped");
    }

    async fn ensure_connected(&mut self, voice_channel: ChannelId) -> Result<(), PlaybackError> {
        if self.state.connection.is_none() {
            info!(channel_id = voice_channel.0, "Joining voice channel");
            let connection = self.connector.connect(self.guild_id, voice_channel).await?;
            self.state.connection = Some(connection);
        }

        Ok(())
    }

    async fn enqueue(
        &mut self,
        voice_channel: ChannelId,
        tracks: Vec<Track>,
    ) -> Result<Enqueued, PlaybackError> {
        self.ensure_connected(voice_channel).await?;

        let added = tracks.len();
        let position = self.state.queue.len() + 1;
        self.state.queue.extend(tracks);
        info!(added, queued = self.state.queue.len(), "Tracks enqueued");

        let idle = !self.state.is_busy();
        if added > 0 && idle {
            self.play_head(true).await;
        }
        // every stream in the batch may have failed to start
        let started = idle && self.state.is_busy();

        Ok(Enqueued {
            added,
            position,
            started,
        })
    }

    /// Starts the next track. A track whose stream cannot be opened is dropped and the one
    /// after it is tried.
    async fn play_head(&mut self, mut honour_loop: bool) {
        if self.state.connection.is_none() {
            warn!("No connection to play on");
            self.state.slot = Slot::Idle;
            return;
        }

        loop {
            let Some(track) = self.state.next_track(honour_loop) else {
                info!("Queue is empty");
                self.state.slot = Slot::Idle;
                return;
            };

            self.state.generation += 1;
            let notifier = TrackEndNotifier {
                sender: self.sender.clone(),
                generation: self.state.generation,
            };
            let source = Source::Remote(track.locator.clone());

            let Some(connection) = self.state.connection.as_mut() else {
                self.state.slot = Slot::Idle;
                return;
            };

            match connection.play(&source, notifier).await {
                Ok(()) => {
                    info!(title = %track.title, url = %track.locator, "Now playing");
                    self.status
                        .post(track.origin, format!("Now playing: **{}**", track.display()))
                        .await;
                    self.state.slot = Slot::Track {
                        track,
                        paused: false,
                    };
                    return;
                }
                Err(why) => {
                    error!(title = %track.title, "Could not start track: {why}");
                    self.status
                        .post(
                            track.origin,
                            format!("Could not play **{}**, skipping it.", track.title),
                        )
                        .await;
                    self.state.slot = Slot::Idle;
                    honour_loop = false;
                }
            }
        }
    }

    async fn track_ended(&mut self, generation: u64) {
        if generation != self.state.generation {
            debug!(generation, current = self.state.generation, "Ignoring stale track end");
            return;
        }

        if self.state.is_busy() {
            self.play_head(true).await;
        }
    }

    async fn play_effect(
        &mut self,
        voice_channel: ChannelId,
        path: PathBuf,
    ) -> Result<(), PlaybackError> {
        if self.state.is_busy() {
            return Err(PlaybackError::Busy);
        }

        if !path.exists() {
            return Err(PlaybackError::MissingAsset(path));
        }

        self.ensure_connected(voice_channel).await?;

        self.state.generation += 1;
        let notifier = TrackEndNotifier {
            sender: self.sender.clone(),
            generation: self.state.generation,
        };

        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;
        connection.play(&Source::File(path), notifier).await?;

        self.state.slot = Slot::Effect;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;

        match &mut self.state.slot {
            Slot::Track { paused, .. } if !*paused => {
                connection.pause()?;
                *paused = true;
                Ok(())
            }
            _ => Err(PlaybackError::NothingPlaying),
        }
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;

        match &mut self.state.slot {
            Slot::Track { paused, .. } if *paused => {
                connection.resume()?;
                *paused = false;
                Ok(())
            }
            _ => Err(PlaybackError::NothingPaused),
        }
    }

    fn stop(&mut self) -> Result<usize, PlaybackError> {
        let busy = self.state.is_busy();
        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;

        if busy {
            connection.stop();
            self.state.generation += 1;
        }

        let cleared = self.state.queue.len();
        self.state.queue.clear();
        self.state.slot = Slot::Idle;
        info!(cleared, "Playback stopped");

        Ok(cleared)
    }

    async fn skip(&mut self) -> Result<Skipped, PlaybackError> {
        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;

        let skipped = match &self.state.slot {
            Slot::Track { track, .. } => track.clone(),
            _ => return Err(PlaybackError::NothingPlaying),
        };

        connection.stop();
        self.state.generation += 1;
        info!(title = %skipped.title, "Skipping");

        // a skip always moves past the current track, looping or not
        self.play_head(false).await;

        Ok(Skipped {
            skipped,
            next: self.state.current().cloned(),
        })
    }

    fn shuffle(&mut self) -> Result<usize, PlaybackError> {
        if self.state.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }

        self.state.queue.make_contiguous().shuffle(&mut thread_rng());

        Ok(self.state.queue.len())
    }

    fn list_queue(&self, page: usize, page_size: usize) -> QueueListing {
        let titles: Vec<String> = self
            .state
            .queue
            .iter()
            .map(|track| track.title.clone())
            .collect();

        QueueListing {
            now_playing: self.state.current().cloned(),
            loop_current: self.state.loop_current,
            page: QueuePage::build(&titles, page_size, page),
        }
    }

    /// Leaves the voice channel. The state is only reset once the connection is closed.
    async fn disconnect(&mut self) -> Result<(), PlaybackError> {
        let connection = self
            .state
            .connection
            .as_mut()
            .ok_or(PlaybackError::NotConnected)?;

        connection.disconnect().await?;
        info!("Left voice channel");

        self.state.connection = None;
        self.state.generation += 1;
        self.state.queue.clear();
        self.state.slot = Slot::Idle;

        Ok(())
    }
}
