use std::sync::Arc;

use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::ChannelId;
use serenity::Result as SerenityResult;
use tracing::info;

use crate::player::StatusSink;

/// Posts player status messages to Discord text channels.
pub struct ChannelNotifier {
    http: Arc<Http>,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        ChannelNotifier { http }
    }
}

#[async_trait]
impl StatusSink for ChannelNotifier {
    async fn post(&self, channel_id: ChannelId, content: String) {
        check_msg(channel_id.say(&self.http, content).await);
    }
}

/// Checks that a message successfully sent; if not, then logs why.
pub fn check_msg(result: SerenityResult<Message>) {
    if let Err(why) = result {
        info!("Error sending message: {why:?}");
    }
}
