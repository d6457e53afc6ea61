use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Data, Error};

/// What a voice state change of the bot itself means for the session.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionChange {
    Disconnected,
    Moved(serenity::ChannelId),
    Unchanged,
}

pub fn session_change(
    current: Option<serenity::ChannelId>,
    new_channel: Option<serenity::ChannelId>,
) -> SessionChange {
    match (current, new_channel) {
        (Some(_), None) => SessionChange::Disconnected,
        (Some(old), Some(new)) if old != new => SessionChange::Moved(new),
        _ => SessionChange::Unchanged,
    }
}

pub async fn handle(
    ctx: &serenity::Context,
    _old: &Option<serenity::VoiceState>,
    new: &serenity::VoiceState,
    data: &Data,
) -> Result<(), Error> {
    if new.user_id != ctx.cache.current_user().id {
        return Ok(());
    }

    match session_change(data.radio.channel().await, new.channel_id) {
        SessionChange::Disconnected => {
            info!("disconnected from voice, ending session");
            data.radio.end_session().await;
        }
        SessionChange::Moved(channel_id) => {
            info!("moved to voice channel {channel_id}");
            data.radio.set_channel(channel_id).await;
        }
        SessionChange::Unchanged => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use self::serenity::ChannelId;

    #[test]
    fn test_session_change() {
        let a = ChannelId::new(1);
        let b = ChannelId::new(2);
        assert_eq!(session_change(Some(a), None), SessionChange::Disconnected);
        assert_eq!(session_change(Some(a), Some(b)), SessionChange::Moved(b));
        assert_eq!(session_change(Some(a), Some(a)), SessionChange::Unchanged);
        assert_eq!(session_change(None, Some(a)), SessionChange::Unchanged);
    }
}
