use std::sync::Arc;

use serenity::client::Context;
use serenity::framework::standard::macros::{command, group, hook};
use serenity::framework::standard::{Args, CommandError, CommandResult, StandardFramework};
use serenity::model::channel::Message;
use serenity::model::channel::ReactionType::Unicode;
use serenity::model::id::{ChannelId, GuildId};
use tracing::{error, info};

use crate::config::Config;
use crate::error::PlaybackError;
use crate::models::SoundEffect;
use crate::notify::check_msg;
use crate::player::QueueManager;
use crate::resolve::Resolve;
use crate::{ConfigKey, PlayerKey, ResolverKey};

const GUNBLADE_IMAGE: &str = "gunblade.png";

#[group]
#[commands(
    play,
    pause,
    resume,
    stop,
    skip,
    queue,
    shuffle,
    toggle_loop,
    dc,
    now_playing,
    heartsteel,
    viktor,
    gunblade,
    help
)]
struct General;

pub fn framework(prefix: &str) -> StandardFramework {
    StandardFramework::new()
        .configure(|c| c.prefix(prefix))
        .after(after)
        .group(&GENERAL_GROUP)
}

/// Single place where command failures become chat messages.
#[hook]
async fn after(ctx: &Context, msg: &Message, command_name: &str, command_result: CommandResult) {
    let Err(why) = command_result else {
        return;
    };

    let reply = match why.downcast_ref::<PlaybackError>() {
        Some(error @ PlaybackError::Transport(_)) => {
            error!(command = command_name, "{error}");
            error.user_message()
        }
        Some(error) => {
            info!(command = command_name, "{error}");
            error.user_message()
        }
        None => {
            error!(command = command_name, "Command failed: {why:?}");
            "An error occurred. Please try again.".to_string()
        }
    };

    check_msg(msg.channel_id.say(&ctx.http, reply).await);
}

#[command]
#[only_in(guilds)]
async fn play(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let query = args.message().trim();

    if query.is_empty() {
        check_msg(
            msg.channel_id
                .say(&ctx.http, "Give me a link or something to search for.")
                .await,
        );
        return Ok(());
    }

    let loading_emoji = Unicode("⏳".to_string());
    react(ctx, msg, "⏳").await;

    let result = play_query(ctx, msg, query).await;

    let bot_id = ctx.cache.current_user_id();
    if let Err(why) = msg
        .channel_id
        .delete_reaction(&ctx.http, msg.id, Some(bot_id), loading_emoji)
        .await
    {
        info!("Error removing reaction: {why:?}");
    }

    let answer_emoji = if result.is_ok() { "👍" } else { "💀" };
    react(ctx, msg, answer_emoji).await;

    result
}

async fn play_query(ctx: &Context, msg: &Message, query: &str) -> CommandResult {
    let guild_id = get_guild_id(msg)?;
    let voice_channel = get_voice_channel(ctx, msg)?;

    info!("User input is {query}");
    check_msg(
        msg.channel_id
            .say(&ctx.http, format!("Searching for: **{query}**"))
            .await,
    );

    let resolution = get_resolver(ctx).await?.resolve(query, msg.channel_id).await?;
    let count = resolution.tracks.len();
    let first_title = resolution
        .tracks
        .first()
        .map(|track| track.display())
        .unwrap_or_default();

    let enqueued = get_player(ctx)
        .await?
        .enqueue(guild_id, voice_channel, resolution.tracks)
        .await?;

    let reply = match resolution.playlist {
        Some(name) => Some(format!("Adding playlist: **{name}** ({count} songs)")),
        None if !enqueued.started => Some(format!(
            "**{first_title}** has been added to the queue! (#{})",
            enqueued.position
        )),
        None => None,
    };

    if let Some(reply) = reply {
        check_msg(msg.channel_id.say(&ctx.http, reply).await);
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn pause(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    get_player(ctx).await?.pause(guild_id).await?;
    check_msg(msg.channel_id.say(&ctx.http, "Paused the music.").await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn resume(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    get_player(ctx).await?.resume(guild_id).await?;
    check_msg(msg.channel_id.say(&ctx.http, "Resumed the music.").await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn stop(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    let cleared = get_player(ctx).await?.stop(guild_id).await?;
    info!("Stopped playback, {cleared} tracks dropped");
    check_msg(
        msg.channel_id
            .say(&ctx.http, "Stopped the music and cleared the queue.")
            .await,
    );

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn skip(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    let skipped = get_player(ctx).await?.skip(guild_id).await?;

    let reply = match skipped.next {
        Some(_) => format!("Skipped **{}**.", skipped.skipped.title),
        None => format!(
            "Skipped **{}**, the queue is now empty.",
            skipped.skipped.title
        ),
    };
    check_msg(msg.channel_id.say(&ctx.http, reply).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn queue(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let guild_id = get_guild_id(msg)?;
    let page_size = get_config(ctx).await?.page_size;

    // pages are 1-based for users
    let requested = args.single::<usize>().unwrap_or(1).saturating_sub(1);

    let listing = get_player(ctx)
        .await?
        .list_queue(guild_id, requested, page_size)
        .await?;

    if listing.page.is_empty() && listing.now_playing.is_none() {
        check_msg(msg.channel_id.say(&ctx.http, "The queue is empty!").await);
        return Ok(());
    }

    let description = if listing.page.is_empty() {
        "Nothing queued.".to_string()
    } else {
        listing.page.render()
    };

    let mut footer = listing.page.footer();
    if listing.loop_current {
        footer.push_str(" · 🔁 looping");
    }

    check_msg(
        msg.channel_id
            .send_message(&ctx.http, |m| {
                m.embed(|e| {
                    e.title("Current Queue")
                        .description(description)
                        .footer(|f| f.text(footer));

                    if let Some(track) = &listing.now_playing {
                        e.field("Now playing", track.display(), false);
                    }

                    e
                })
            })
            .await,
    );

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn shuffle(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    info!("Shuffle - command invoked from guild {}!", guild_id.0);
    let shuffled = get_player(ctx).await?.shuffle(guild_id).await?;

    react(ctx, msg, "👍").await;
    check_msg(
        msg.channel_id
            .say(&ctx.http, format!("Shuffled the queue ({shuffled} songs)."))
            .await,
    );

    Ok(())
}

#[command("loop")]
#[only_in(guilds)]
async fn toggle_loop(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    let looping = get_player(ctx).await?.toggle_loop(guild_id).await?;
    let state = if looping { "enabled" } else { "disabled" };
    check_msg(
        msg.channel_id
            .say(&ctx.http, format!("Looping is now {state}."))
            .await,
    );

    Ok(())
}

#[command]
#[aliases("disconnect", "leave")]
#[only_in(guilds)]
async fn dc(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    get_player(ctx).await?.disconnect(guild_id).await?;
    check_msg(
        msg.channel_id
            .say(&ctx.http, "Disconnected from the voice channel.")
            .await,
    );

    Ok(())
}

#[command("np")]
#[aliases("nowplaying")]
#[only_in(guilds)]
async fn now_playing(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(msg)?;

    let snapshot = get_player(ctx).await?.now_playing(guild_id).await?;

    let reply = match &snapshot.now_playing {
        Some(track) => {
            let mut reply = format!("Now playing: **{}**", track.display());
            if snapshot.paused {
                reply.push_str(" (paused)");
            }
            if snapshot.loop_current {
                reply.push_str(" 🔁");
            }
            reply.push_str(&format!("\n{} more in the queue.", snapshot.queued.len()));
            reply
        }
        None if snapshot.effect => "Playing a sound effect.".to_string(),
        None => "No music is currently playing.".to_string(),
    };
    check_msg(msg.channel_id.say(&ctx.http, reply).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn heartsteel(ctx: &Context, msg: &Message) -> CommandResult {
    play_effect(ctx, msg, SoundEffect::Heartsteel).await
}

#[command]
#[only_in(guilds)]
async fn viktor(ctx: &Context, msg: &Message) -> CommandResult {
    play_effect(ctx, msg, SoundEffect::Viktor).await
}

async fn play_effect(ctx: &Context, msg: &Message, effect: SoundEffect) -> CommandResult {
    let guild_id = get_guild_id(msg)?;
    let voice_channel = get_voice_channel(ctx, msg)?;
    let path = effect.path_in(&get_config(ctx).await?.assets_dir);

    get_player(ctx)
        .await?
        .play_effect(guild_id, voice_channel, path)
        .await?;
    check_msg(msg.channel_id.say(&ctx.http, effect.announcement()).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn gunblade(ctx: &Context, msg: &Message) -> CommandResult {
    let path = get_config(ctx).await?.assets_dir.join(GUNBLADE_IMAGE);

    if !path.exists() {
        return Err(PlaybackError::MissingAsset(path).into());
    }

    msg.channel_id
        .send_files(&ctx.http, vec![path.as_path()], |m| {
            m.content("WE ALL MISS YOU GUNBLADE")
        })
        .await?;

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn help(ctx: &Context, msg: &Message) -> CommandResult {
    let prefix = get_config(ctx).await?.prefix.clone();

    let message = format!(
        r#"
**Commands:**
    **{prefix}play [URL|Title]** - Plays (or adds to the queue) a YouTube video, YouTube playlist, Spotify track/album/playlist or the first search result.
    **{prefix}pause** - Pauses the current track.
    **{prefix}resume** - Resumes the paused track.
    **{prefix}stop** - Stops the current track and clears the queue.
    **{prefix}skip** - Plays the next track, even when looping.
    **{prefix}queue [PAGE]** - Shows the queue of tracks.
    **{prefix}np** - Shows the current track.
    **{prefix}shuffle** - Reorders the queue randomly.
    **{prefix}loop** - Repeats the current track until toggled off.
    **{prefix}dc** - Leaves the voice channel and forgets the queue.
    **{prefix}heartsteel**, **{prefix}viktor** - Sound effects.
    **{prefix}gunblade** - WE MISS YOU GUNBLADE.
    "#
    );

    check_msg(msg.channel_id.say(&ctx.http, message).await);

    Ok(())
}

async fn react(ctx: &Context, msg: &Message, emoji: &str) {
    if let Err(why) = msg.react(&ctx.http, Unicode(emoji.to_string())).await {
        info!("Error adding reaction: {why:?}");
    }
}

fn get_guild_id(msg: &Message) -> CommandResult<GuildId> {
    msg.guild_id.ok_or(CommandError::from("Guild not found"))
}

fn get_voice_channel(ctx: &Context, msg: &Message) -> CommandResult<ChannelId> {
    let guild = msg
        .guild(&ctx.cache)
        .ok_or(CommandError::from("Guild not found"))?;

    guild
        .voice_states
        .get(&msg.author.id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or_else(|| PlaybackError::UserNotInVoice.into())
}

async fn get_player(ctx: &Context) -> CommandResult<Arc<QueueManager>> {
    let data = ctx.data.read().await;

    data.get::<PlayerKey>()
        .cloned()
        .ok_or(CommandError::from("Player not initialised"))
}

async fn get_resolver(ctx: &Context) -> CommandResult<Arc<dyn Resolve>> {
    let data = ctx.data.read().await;

    data.get::<ResolverKey>()
        .cloned()
        .ok_or(CommandError::from("Resolver not initialised"))
}

async fn get_config(ctx: &Context) -> CommandResult<Arc<Config>> {
    let data = ctx.data.read().await;

    data.get::<ConfigKey>()
        .cloned()
        .ok_or(CommandError::from("Config not initialised"))
}
