//! In-memory stand-ins for the voice connection and status channel.

use std::sync::{Arc, Mutex};

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};

use super::{StatusSink, TrackEndNotifier, VoiceConnection, VoiceConnector};
use crate::error::PlaybackError;
use crate::models::Source;

#[derive(Default)]
struct VoiceLog {
    connects: usize,
    disconnects: usize,
    stops: usize,
    pauses: usize,
    resumes: usize,
    played: Vec<Source>,
    notifiers: Vec<TrackEndNotifier>,
    fail_connect: bool,
    fail_disconnect: bool,
    failing: Vec<String>,
}

/// Records everything asked of it; shared between the connector and every connection.
#[derive(Clone, Default)]
pub struct FakeVoice {
    log: Arc<Mutex<VoiceLog>>,
}

impl FakeVoice {
    pub fn fail_connect(&self) {
        self.log.lock().unwrap().fail_connect = true;
    }

    pub fn fail_disconnect(&self) {
        self.log.lock().unwrap().fail_disconnect = true;
    }

    pub fn fail_locator(&self, locator: &str) {
        self.log.lock().unwrap().failing.push(locator.to_string());
    }

    /// Locators (or file paths) of every stream started, in order.
    pub fn played(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .played
            .iter()
            .map(|source| match source {
                Source::Remote(locator) => locator.clone(),
                Source::File(path) => path.display().to_string(),
            })
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.log.lock().unwrap().disconnects
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn pauses(&self) -> usize {
        self.log.lock().unwrap().pauses
    }

    pub fn resumes(&self) -> usize {
        self.log.lock().unwrap().resumes
    }

    /// Reports the end of the `index`th started stream.
    pub fn finish(&self, index: usize) {
        let notifier = self.log.lock().unwrap().notifiers[index].clone();
        notifier.notify();
    }

    pub fn finish_latest(&self) {
        let notifier = self.log.lock().unwrap().notifiers.last().cloned();
        if let Some(notifier) = notifier {
            notifier.notify();
        }
    }
}

#[async_trait]
impl VoiceConnector for FakeVoice {
    async fn connect(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnection>, PlaybackError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_connect {
            return Err(PlaybackError::Transport("connect refused".to_string()));
        }

        log.connects += 1;
        Ok(Box::new(FakeConnection { voice: self.clone() }))
    }
}

struct FakeConnection {
    voice: FakeVoice,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn play(
        &mut self,
        source: &Source,
        notifier: TrackEndNotifier,
    ) -> Result<(), PlaybackError> {
        let mut log = self.voice.log.lock().unwrap();

        if let Source::Remote(locator) = source {
            if log.failing.contains(locator) {
                return Err(PlaybackError::Transport("stream refused".to_string()));
            }
        }

        log.played.push(source.clone());
        log.notifiers.push(notifier);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.voice.log.lock().unwrap().pauses += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        self.voice.log.lock().unwrap().resumes += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.voice.log.lock().unwrap().stops += 1;
    }

    async fn disconnect(&mut self) -> Result<(), PlaybackError> {
        let mut log = self.voice.log.lock().unwrap();
        if log.fail_disconnect {
            return Err(PlaybackError::Transport("gateway closed".to_string()));
        }

        log.disconnects += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingStatus {
    messages: Arc<Mutex<Vec<(ChannelId, String)>>>,
}

impl RecordingStatus {
    pub fn messages(&self) -> Vec<(ChannelId, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSink for RecordingStatus {
    async fn post(&self, channel_id: ChannelId, content: String) {
        self.messages.lock().unwrap().push((channel_id, content));
    }
}
