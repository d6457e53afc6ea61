//! Daily special broadcast: scheduling and picking where to air it.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serenity::model::id::ChannelId;
use serenity::prelude::Context;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::Radio;
use crate::config::Config;
use crate::utils::voice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceChannelInfo {
    pub id: ChannelId,
    pub listeners: usize,
}

/// First instant strictly after `now` showing `at` on the local wall clock.
/// Nonexistent local times fall to the next day; ambiguous ones take the earlier instant.
pub fn next_occurrence(now: DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..=3)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| tz.from_local_datetime(&date.and_time(at)).earliest())
        .find(|candidate| *candidate > now)
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

/// The admin's channel, else the busiest one (first wins ties), else the first one.
pub fn pick_channel(
    admin_channel: Option<ChannelId>,
    channels: &[VoiceChannelInfo],
) -> Option<ChannelId> {
    admin_channel
        .or_else(|| {
            channels
                .iter()
                .filter(|c| c.listeners > 0)
                .min_by_key(|c| Reverse(c.listeners))
                .map(|c| c.id)
        })
        .or_else(|| channels.first().map(|c| c.id))
}

pub fn spawn_daily(ctx: Context, radio: Radio, config: Arc<Config>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now().with_timezone(&config.broadcast_tz);
            let next = next_occurrence(now, config.broadcast_time);
            info!("next broadcast at {next}");
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if let Err(e) = run(&ctx, &radio, &config).await {
                error!("daily broadcast failed: {e}");
            }
        }
    })
}

/// Airs the broadcast, joining a channel first when disconnected.
pub async fn run(ctx: &Context, radio: &Radio, config: &Config) -> Result<(), crate::Error> {
    info!("broadcast time");
    if radio.is_connected().await {
        radio.start_broadcast().await;
        return Ok(());
    }

    let guild_id = ctx
        .cache
        .guilds()
        .first()
        .copied()
        .ok_or("bot is not in any guild")?;

    let target = {
        let guild = ctx
            .cache
            .guild(guild_id)
            .ok_or("guild missing from cache")?;
        let admin_channel = voice::member_channel_by_name(&guild, &config.admin_user);
        pick_channel(admin_channel, &voice::voice_channels(&guild))
    };
    let channel_id = target.ok_or("no voice channel to broadcast in")?;

    radio.lock().await.stage_broadcast();
    let joined = radio.connect(ctx, guild_id, channel_id).await;
    if joined.is_err() {
        radio.lock().await.pending_broadcast = false;
    }
    joined
}
