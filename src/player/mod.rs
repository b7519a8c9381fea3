//! Per-guild playback queues.
//!
//! Every guild gets its own task owning a `GuildPlaybackState`. Commands and track-end
//! notifications are both messages into that task's channel, so a completion racing a
//! `skip`, `stop` or `dc` is handled in arrival order and never mutates state on its own.

mod guild;
#[cfg(test)]
pub mod testing;
pub mod voice;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::error::PlaybackError;
use crate::models::{Source, Track};
use crate::pagination::QueuePage;

/// Opens audio output connections, one per guild.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnection>, PlaybackError>;
}

/// A guild's audio output. Owned exclusively by that guild's player task.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Starts streaming `source`, replacing whatever was playing. `notifier` must be fired
    /// once the stream ends, however it ends.
    async fn play(&mut self, source: &Source, notifier: TrackEndNotifier)
        -> Result<(), PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    fn resume(&mut self) -> Result<(), PlaybackError>;

    fn stop(&mut self);

    async fn disconnect(&mut self) -> Result<(), PlaybackError>;
}

/// Where "now playing" style status messages go.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn post(&self, channel_id: ChannelId, content: String);
}

/// Handed to a [`VoiceConnection`] with every stream. Firing it posts a message to the
/// guild task; it never touches playback state directly.
#[derive(Clone)]
pub struct TrackEndNotifier {
    sender: GuildHandle,
    generation: u64,
}

impl TrackEndNotifier {
    pub fn notify(&self) {
        let message = GuildMessage::TrackEnded {
            generation: self.generation,
        };

        if self.sender.send(message).is_err() {
            debug!(generation = self.generation, "Track ended after its guild player closed");
        }
    }
}

pub(crate) type Reply<T> = oneshot::Sender<Result<T, PlaybackError>>;
pub(crate) type GuildHandle = mpsc::UnboundedSender<GuildMessage>;

pub(crate) enum GuildMessage {
    Enqueue {
        voice_channel: ChannelId,
        tracks: Vec<Track>,
        reply: Reply<Enqueued>,
    },
    PlayEffect {
        voice_channel: ChannelId,
        path: PathBuf,
        reply: Reply<()>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<usize>,
    },
    Skip {
        reply: Reply<Skipped>,
    },
    Shuffle {
        reply: Reply<usize>,
    },
    ToggleLoop {
        reply: Reply<bool>,
    },
    ListQueue {
        page: usize,
        page_size: usize,
        reply: Reply<QueueListing>,
    },
    Snapshot {
        reply: Reply<GuildSnapshot>,
    },
    /// Ends the guild task once the connection is closed, or regardless when `force` is set.
    Disconnect {
        force: bool,
        reply: Reply<()>,
    },
    TrackEnded {
        generation: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enqueued {
    pub added: usize,
    /// 1-based queue position of the first added track.
    pub position: usize,
    /// Whether the first added track started playing right away.
    pub started: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped {
    pub skipped: Track,
    pub next: Option<Track>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueListing {
    pub now_playing: Option<Track>,
    pub loop_current: bool,
    pub page: QueuePage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildSnapshot {
    pub now_playing: Option<Track>,
    pub paused: bool,
    pub effect: bool,
    pub queued: Vec<Track>,
    pub loop_current: bool,
    pub connected: bool,
}

/// Playback queues for every guild the bot is used in.
pub struct QueueManager {
    connector: Arc<dyn VoiceConnector>,
    status: Arc<dyn StatusSink>,
    guilds: RwLock<HashMap<GuildId, GuildHandle>>,
}

impl QueueManager {
    pub fn new(connector: Arc<dyn VoiceConnector>, status: Arc<dyn StatusSink>) -> Self {
        QueueManager {
            connector,
            status,
            guilds: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `tracks`, connecting to `voice_channel` first if the guild has no
    /// connection. Starts playback when nothing is playing.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        tracks: Vec<Track>,
    ) -> Result<Enqueued, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Enqueue {
            voice_channel,
            tracks,
            reply,
        })
        .await
    }

    pub async fn play_effect(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        path: PathBuf,
    ) -> Result<(), PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::PlayEffect {
            voice_channel,
            path,
            reply,
        })
        .await
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Pause { reply })
            .await
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Resume { reply })
            .await
    }

    /// Stops playback and clears the queue, returning how many queued tracks were dropped.
    pub async fn stop(&self, guild_id: GuildId) -> Result<usize, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Stop { reply })
            .await
    }

    /// Advances past the current track exactly once, even when it is looping.
    pub async fn skip(&self, guild_id: GuildId) -> Result<Skipped, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Skip { reply })
            .await
    }

    pub async fn shuffle(&self, guild_id: GuildId) -> Result<usize, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Shuffle { reply })
            .await
    }

    /// Flips the loop flag and returns its new value.
    pub async fn toggle_loop(&self, guild_id: GuildId) -> Result<bool, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::ToggleLoop { reply })
            .await
    }

    /// `page` is 0-based and clamped to the available pages.
    pub async fn list_queue(
        &self,
        guild_id: GuildId,
        page: usize,
        page_size: usize,
    ) -> Result<QueueListing, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::ListQueue {
            page,
            page_size,
            reply,
        })
        .await
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> Result<GuildSnapshot, PlaybackError> {
        self.request(guild_id, |reply| GuildMessage::Snapshot { reply })
            .await
    }

    /// Closes the guild's connection and discards its state, queue included. When closing
    /// the connection fails the state is kept as it was.
    pub async fn disconnect(&self, guild_id: GuildId) -> Result<(), PlaybackError> {
        self.close(guild_id, false).await
    }

    /// Like [`QueueManager::disconnect`], for when the bot was already removed from voice:
    /// the state is discarded even if closing the connection fails.
    pub async fn forget(&self, guild_id: GuildId) {
        match self.close(guild_id, true).await {
            Ok(()) => info!(guild_id = guild_id.0, "Dropped guild state after voice disconnect"),
            Err(PlaybackError::NotConnected) => {
                debug!(guild_id = guild_id.0, "No voice session to forget")
            }
            Err(why) => warn!(
                guild_id = guild_id.0,
                "Dropped guild state, closing the connection failed: {why}"
            ),
        }
    }

    async fn close(&self, guild_id: GuildId, force: bool) -> Result<(), PlaybackError> {
        let handle = self
            .guilds
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .ok_or(PlaybackError::NotConnected)?;

        let (reply, receiver) = oneshot::channel();
        handle
            .send(GuildMessage::Disconnect { force, reply })
            .map_err(|_| PlaybackError::NotConnected)?;

        let result = receiver.await.map_err(|_| PlaybackError::NotConnected)?;

        if force || result.is_ok() {
            let mut guilds = self.guilds.write().await;
            // a newer session may already have replaced this one
            if guilds
                .get(&guild_id)
                .map_or(false, |current| current.same_channel(&handle))
            {
                guilds.remove(&guild_id);
            }
        }

        result
    }

    async fn request<T, F>(&self, guild_id: GuildId, build: F) -> Result<T, PlaybackError>
    where
        F: FnOnce(Reply<T>) -> GuildMessage,
    {
        let handle = self.handle(guild_id).await;
        let (reply, receiver) = oneshot::channel();

        handle
            .send(build(reply))
            .map_err(|_| PlaybackError::NotConnected)?;

        receiver.await.map_err(|_| PlaybackError::NotConnected)?
    }

    async fn handle(&self, guild_id: GuildId) -> GuildHandle {
        if let Some(handle) = self.guilds.read().await.get(&guild_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let mut guilds = self.guilds.write().await;

        match guilds.get(&guild_id) {
            Some(handle) if !handle.is_closed() => handle.clone(),
            _ => {
                info!(guild_id = guild_id.0, "Creating playback state");
                let handle =
                    guild::GuildPlayer::spawn(guild_id, self.connector.clone(), self.status.clone());
                guilds.insert(guild_id, handle.clone());
                handle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::testing::{FakeVoice, RecordingStatus};
    use super::*;

    const GUILD: GuildId = GuildId(1);
    const VOICE: ChannelId = ChannelId(2);
    const TEXT: ChannelId = ChannelId(3);

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            locator: format!("https://www.youtube.com/watch?v={title}"),
            origin: TEXT,
            duration: None,
        }
    }

    fn tracks(titles: &[&str]) -> Vec<Track> {
        titles.iter().map(|title| track(title)).collect()
    }

    fn setup() -> (QueueManager, FakeVoice, RecordingStatus) {
        let voice = FakeVoice::default();
        let status = RecordingStatus::default();
        let manager = QueueManager::new(Arc::new(voice.clone()), Arc::new(status.clone()));

        (manager, voice, status)
    }

    fn titles(queued: &[Track]) -> Vec<String> {
        queued.iter().map(|track| track.title.clone()).collect()
    }

    fn playing(snapshot: &GuildSnapshot) -> Option<&str> {
        snapshot.now_playing.as_ref().map(|track| track.title.as_str())
    }

    #[tokio::test]
    async fn enqueue_on_idle_guild_starts_playing() {
        let (manager, voice, status) = setup();

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();

        assert!(enqueued.started);
        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("a"));
        assert!(snapshot.queued.is_empty());
        assert_eq!(voice.played(), vec!["https://www.youtube.com/watch?v=a"]);
        assert_eq!(voice.connects(), 1);
        assert!(status
            .messages()
            .contains(&(TEXT, "Now playing: **a**".to_string())));
    }

    #[tokio::test]
    async fn enqueue_while_playing_only_appends() {
        let (manager, voice, _) = setup();
        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();

        let enqueued = manager
            .enqueue(GUILD, VOICE, tracks(&["b", "c"]))
            .await
            .unwrap();

        assert_eq!(
            enqueued,
            Enqueued {
                added: 2,
                position: 1,
                started: false
            }
        );
        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("a"));
        assert_eq!(titles(&snapshot.queued), vec!["b", "c"]);
        assert_eq!(voice.played().len(), 1);
        assert_eq!(voice.connects(), 1);
    }

    #[tokio::test]
    async fn skip_advances_exactly_once() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b", "c"]))
            .await
            .unwrap();

        let skipped = manager.skip(GUILD).await.unwrap();
        assert_eq!(skipped.skipped.title, "a");
        assert_eq!(skipped.next.map(|track| track.title), Some("b".to_string()));

        // the stopped stream of `a` still reports its end
        voice.finish(0);

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("b"));
        assert_eq!(titles(&snapshot.queued), vec!["c"]);
        assert_eq!(voice.played().len(), 2);
        assert_eq!(voice.stops(), 1);
    }

    #[tokio::test]
    async fn skip_without_a_track_is_a_notice() {
        let (manager, _, _) = setup();

        assert!(matches!(
            manager.skip(GUILD).await,
            Err(PlaybackError::NotConnected)
        ));

        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();
        manager.skip(GUILD).await.unwrap();

        assert!(matches!(
            manager.skip(GUILD).await,
            Err(PlaybackError::NothingPlaying)
        ));
    }

    #[tokio::test]
    async fn loop_replays_the_current_track_until_toggled_off() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();

        assert!(manager.toggle_loop(GUILD).await.unwrap());
        voice.finish_latest();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("a"));
        assert_eq!(snapshot.queued.len(), 1);
        assert_eq!(voice.played().len(), 2);

        assert!(!manager.toggle_loop(GUILD).await.unwrap());
        voice.finish_latest();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("b"));
        assert!(snapshot.queued.is_empty());
    }

    #[tokio::test]
    async fn skip_moves_past_a_looping_track() {
        let (manager, voice, _) = setup();
        manager.toggle_loop(GUILD).await.unwrap();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();

        manager.skip(GUILD).await.unwrap();
        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("b"));
        assert!(snapshot.loop_current);

        voice.finish_latest();
        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("b"));
    }

    #[tokio::test]
    async fn natural_end_of_the_last_track_goes_idle() {
        let (manager, voice, _) = setup();
        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();

        voice.finish_latest();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), None);
        assert!(snapshot.connected);

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["b"])).await.unwrap();
        assert!(enqueued.started);
    }

    #[tokio::test]
    async fn shuffle_keeps_membership_and_current_track() {
        let (manager, _, _) = setup();
        let names: Vec<String> = (0..20).map(|n| format!("t{n}")).collect();
        let queued: Vec<Track> = names.iter().map(|name| track(name)).collect();
        manager.enqueue(GUILD, VOICE, queued).await.unwrap();

        let shuffled = manager.shuffle(GUILD).await.unwrap();

        assert_eq!(shuffled, 19);
        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("t0"));

        let mut after = titles(&snapshot.queued);
        after.sort();
        let mut before = names[1..].to_vec();
        before.sort();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn shuffle_on_empty_queue_is_a_notice() {
        let (manager, _, _) = setup();

        assert!(matches!(
            manager.shuffle(GUILD).await,
            Err(PlaybackError::QueueEmpty)
        ));
    }

    #[tokio::test]
    async fn list_queue_pages_the_pending_tracks() {
        let (manager, _, _) = setup();
        let queued: Vec<Track> = (0..=25).map(|n| track(&format!("t{n}"))).collect();
        manager.enqueue(GUILD, VOICE, queued).await.unwrap();

        let listing = manager.list_queue(GUILD, 2, 10).await.unwrap();

        assert_eq!(listing.now_playing.map(|track| track.title), Some("t0".to_string()));
        assert_eq!(listing.page.page_count, 3);
        assert_eq!(listing.page.entries.first(), Some(&(21, "t21".to_string())));
        assert_eq!(listing.page.entries.last(), Some(&(25, "t25".to_string())));

        let clamped = manager.list_queue(GUILD, 40, 10).await.unwrap();
        assert_eq!(clamped.page.index, 2);
    }

    #[tokio::test]
    async fn pause_and_resume_follow_the_playback_state() {
        let (manager, voice, _) = setup();

        assert!(matches!(
            manager.pause(GUILD).await,
            Err(PlaybackError::NotConnected)
        ));

        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();
        assert!(matches!(
            manager.resume(GUILD).await,
            Err(PlaybackError::NothingPaused)
        ));

        manager.pause(GUILD).await.unwrap();
        assert!(manager.now_playing(GUILD).await.unwrap().paused);
        assert!(matches!(
            manager.pause(GUILD).await,
            Err(PlaybackError::NothingPlaying)
        ));

        manager.resume(GUILD).await.unwrap();
        assert!(!manager.now_playing(GUILD).await.unwrap().paused);
        assert_eq!(voice.pauses(), 1);
        assert_eq!(voice.resumes(), 1);
    }

    #[tokio::test]
    async fn enqueue_while_paused_only_appends() {
        let (manager, voice, _) = setup();
        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();
        manager.pause(GUILD).await.unwrap();

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["b"])).await.unwrap();

        assert!(!enqueued.started);
        assert_eq!(voice.played().len(), 1);
    }

    #[tokio::test]
    async fn stop_clears_the_queue_but_keeps_the_connection() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(manager.stop(GUILD).await.unwrap(), 2);
        voice.finish_latest();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), None);
        assert!(snapshot.queued.is_empty());
        assert!(snapshot.connected);

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["d"])).await.unwrap();
        assert!(enqueued.started);
        assert_eq!(voice.connects(), 1);
    }

    #[tokio::test]
    async fn disconnect_discards_the_guild_state() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();
        manager.toggle_loop(GUILD).await.unwrap();

        manager.disconnect(GUILD).await.unwrap();
        assert_eq!(voice.disconnects(), 1);
        voice.finish(0);

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert!(!snapshot.connected);
        assert!(snapshot.queued.is_empty());
        assert!(!snapshot.loop_current);

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["c"])).await.unwrap();
        assert!(enqueued.started);
        assert_eq!(voice.connects(), 2);
        assert_eq!(
            playing(&manager.now_playing(GUILD).await.unwrap()),
            Some("c")
        );
    }

    #[tokio::test]
    async fn failed_disconnect_keeps_the_session() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();
        voice.fail_disconnect();

        assert!(matches!(
            manager.disconnect(GUILD).await,
            Err(PlaybackError::Transport(_))
        ));

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert!(snapshot.connected);
        assert_eq!(playing(&snapshot), Some("a"));
        assert_eq!(titles(&snapshot.queued), vec!["b"]);
    }

    #[tokio::test]
    async fn forget_drops_the_session_even_if_leaving_fails() {
        let (manager, voice, _) = setup();
        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();
        voice.fail_disconnect();

        manager.forget(GUILD).await;

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert!(!snapshot.connected);
        assert!(snapshot.queued.is_empty());
        assert_eq!(playing(&snapshot), None);
    }

    #[tokio::test]
    async fn disconnect_without_state_is_not_connected() {
        let (manager, _, _) = setup();

        assert!(matches!(
            manager.disconnect(GUILD).await,
            Err(PlaybackError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn connect_failure_leaves_the_queue_untouched() {
        let (manager, voice, _) = setup();
        voice.fail_connect();

        assert!(matches!(
            manager.enqueue(GUILD, VOICE, tracks(&["a"])).await,
            Err(PlaybackError::Transport(_))
        ));

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert!(snapshot.queued.is_empty());
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn failed_stream_moves_on_to_the_next_track() {
        let (manager, voice, status) = setup();
        voice.fail_locator("https://www.youtube.com/watch?v=a");

        manager
            .enqueue(GUILD, VOICE, tracks(&["a", "b"]))
            .await
            .unwrap();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("b"));
        assert!(snapshot.queued.is_empty());
        assert!(status
            .messages()
            .iter()
            .any(|(_, message)| message.contains("Could not play **a**")));
    }

    #[tokio::test]
    async fn enqueue_reports_nothing_started_when_no_stream_opens() {
        let (manager, voice, _) = setup();
        voice.fail_locator("https://www.youtube.com/watch?v=a");

        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();

        assert_eq!(
            enqueued,
            Enqueued {
                added: 1,
                position: 1,
                started: false
            }
        );
        assert_eq!(playing(&manager.now_playing(GUILD).await.unwrap()), None);
    }

    #[tokio::test]
    async fn guilds_do_not_share_queues() {
        let (manager, voice, _) = setup();
        let other = GuildId(99);

        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();
        manager.enqueue(other, VOICE, tracks(&["x"])).await.unwrap();

        assert_eq!(voice.connects(), 2);
        assert_eq!(
            playing(&manager.now_playing(other).await.unwrap()),
            Some("x")
        );
        assert_eq!(
            playing(&manager.now_playing(GUILD).await.unwrap()),
            Some("a")
        );
    }

    #[tokio::test]
    async fn effects_refuse_to_interrupt_music() {
        let (manager, _, _) = setup();
        let asset = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();

        assert!(matches!(
            manager.play_effect(GUILD, VOICE, asset).await,
            Err(PlaybackError::Busy)
        ));
    }

    #[tokio::test]
    async fn queued_tracks_start_after_an_effect() {
        let (manager, voice, _) = setup();
        let asset = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");

        manager.play_effect(GUILD, VOICE, asset).await.unwrap();
        let enqueued = manager.enqueue(GUILD, VOICE, tracks(&["a"])).await.unwrap();
        assert!(!enqueued.started);
        assert!(manager.now_playing(GUILD).await.unwrap().effect);

        voice.finish_latest();

        let snapshot = manager.now_playing(GUILD).await.unwrap();
        assert_eq!(playing(&snapshot), Some("a"));
        assert!(!snapshot.effect);
    }

    #[tokio::test]
    async fn missing_effect_file_is_reported() {
        let (manager, _, _) = setup();

        assert!(matches!(
            manager
                .play_effect(GUILD, VOICE, PathBuf::from("does/not/exist.mp3"))
                .await,
            Err(PlaybackError::MissingAsset(_))
        ));
    }
}
