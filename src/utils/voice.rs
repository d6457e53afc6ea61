use serenity::model::channel::ChannelType;
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, UserId};
use serenity::model::voice::VoiceState;

use crate::radio::broadcast::VoiceChannelInfo;

pub fn user_channel(guild: &Guild, user_id: UserId) -> Option<ChannelId> {
    guild.voice_states.get(&user_id).and_then(|vs| vs.channel_id)
}

pub fn member_channel_by_name(guild: &Guild, name: &str) -> Option<ChannelId> {
    guild
        .members
        .values()
        .find(|m| m.user.name == name)
        .and_then(|m| user_channel(guild, m.user.id))
}

fn is_bot(guild: &Guild, state: &VoiceState) -> bool {
    state
        .member
        .as_ref()
        .map(|m| m.user.bot)
        .or_else(|| guild.members.get(&state.user_id).map(|m| m.user.bot))
        .unwrap_or(false)
}

/// Non-bot members currently in `channel`.
pub fn listeners_in(guild: &Guild, channel: ChannelId) -> usize {
    guild
        .voice_states
        .values()
        .filter(|vs| vs.channel_id == Some(channel))
        .filter(|vs| !is_bot(guild, vs))
        .count()
}

/// Voice channels in sidebar order with their listener counts.
pub fn voice_channels(guild: &Guild) -> Vec<VoiceChannelInfo> {
    let mut channels: Vec<_> = guild
        .channels
        .values()
        .filter(|c| c.kind == ChannelType::Voice)
        .map(|c| (c.position, c.id))
        .collect();
    channels.sort();

    channels
        .into_iter()
        .map(|(_, id)| VoiceChannelInfo {
            id,
            listeners: listeners_in(guild, id),
        })
        .collect()
}
