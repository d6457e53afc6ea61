use tracing::error;

use super::reply_error;
use crate::utils::voice;
use crate::{Context, Error};

/// Tritt deinem Sprachkanal bei und startet das Radio
#[poise::command(prefix_command, guild_only)]
pub async fn join(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("guild only")?;

    let target = {
        let guild = ctx.guild().ok_or("guild missing from cache")?;
        voice::user_channel(&guild, ctx.author().id).map(|id| {
            let name = guild
                .channels
                .get(&id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string());
            (id, name)
        })
    };
    let Some((channel_id, channel_name)) = target else {
        return reply_error(ctx, "⚠️ Du musst erst einem Sprachkanal beitreten.").await;
    };

    let radio = &ctx.data().radio;
    match radio
        .connect(ctx.serenity_context(), guild_id, channel_id)
        .await
    {
        Ok(()) => {
            ctx.say(format!("📻 Verbunden mit **{channel_name}**")).await?;
        }
        Err(e) => {
            error!("join {channel_id} failed: {e}");
            reply_error(ctx, &format!("Beitritt fehlgeschlagen: {e}")).await?;
        }
    }

    Ok(())
}
