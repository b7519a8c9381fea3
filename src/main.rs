use std::sync::Arc;

use dotenvy::dotenv;
use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    model::gateway::Ready,
    model::id::{ChannelId, UserId},
    model::voice::VoiceState,
    prelude::{GatewayIntents, TypeMapKey},
};
use songbird::{SerenityInit, Songbird};
use tracing::{error, info};

use crate::config::Config;
use crate::notify::ChannelNotifier;
use crate::player::voice::SongbirdConnector;
use crate::player::QueueManager;
use crate::resolve::{Resolve, TrackResolver};

mod commands;
mod config;
mod error;
mod models;
mod notify;
mod pagination;
mod player;
mod resolve;

struct Handler;

pub struct PlayerKey;

impl TypeMapKey for PlayerKey {
    type Value = Arc<QueueManager>;
}

pub struct ResolverKey;

impl TypeMapKey for ResolverKey {
    type Value = Arc<dyn Resolve>;
}

pub struct ConfigKey;

impl TypeMapKey for ConfigKey {
    type Value = Arc<Config>;
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }

    async fn voice_state_update(&self, ctx: Context, _: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };

        let in_call = match songbird::get(&ctx).await.and_then(|manager| manager.get(guild_id)) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        };

        if !bot_left_voice(new.user_id, new.channel_id, ctx.cache.current_user_id(), in_call) {
            return;
        }

        info!("Bot left the voice channel in guild {}", guild_id.0);

        let player = ctx.data.read().await.get::<PlayerKey>().cloned();
        if let Some(player) = player {
            player.forget(guild_id).await;
        }
    }
}

/// Whether a voice state update reports the bot itself out of voice. An update that arrives
/// after a new call was already joined is stale and ignored.
fn bot_left_voice(
    user_id: UserId,
    channel_id: Option<ChannelId>,
    bot_id: UserId,
    in_call: bool,
) -> bool {
    user_id == bot_id && channel_id.is_none() && !in_call
}

#[tokio::main]
async fn main() {
    // a missing .env is fine when the environment is already set
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(why) => {
            error!("Invalid configuration: {why}");
            return;
        }
    };

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let songbird = Songbird::serenity();

    let mut client = match Client::builder(&config.token, intents)
        .event_handler(Handler)
        .framework(commands::framework(&config.prefix))
        .register_songbird_with(songbird.clone())
        .await
    {
        Ok(client) => client,
        Err(why) => {
            error!("Err creating client: {why:?}");
            return;
        }
    };

    {
        let player = QueueManager::new(
            Arc::new(SongbirdConnector::new(songbird)),
            Arc::new(ChannelNotifier::new(client.cache_and_http.http.clone())),
        );
        let resolver: Arc<dyn Resolve> = Arc::new(TrackResolver::new(
            config.spotify.clone(),
            config.playlist_limit,
        ));

        let mut data = client.data.write().await;
        data.insert::<PlayerKey>(Arc::new(player));
        data.insert::<ResolverKey>(resolver);
        data.insert::<ConfigKey>(config.clone());
    }

    tokio::spawn(async move {
        let _ = client
            .start()
            .await
            .map_err(|why| info!("Client ended: {why:?}"));
    });

    if let Err(why) = tokio::signal::ctrl_c().await {
        error!("Control-C interruption failed: {why:?}");
    }

    info!("Received Ctrl-C, shutting down.");
}
