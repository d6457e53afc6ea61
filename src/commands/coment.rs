use super::{ensure_admin, reply_error};
use crate::{Context, Error};

/// Startet sofort eine Wetter- und Nachrichtensendung (Admin)
#[poise::command(prefix_command, guild_only)]
pub async fn coment(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_admin(ctx).await? {
        return Ok(());
    }

    let radio = &ctx.data().radio;
    if !radio.is_connected().await {
        return reply_error(ctx, "⚠️ Der Bot ist in keinem Sprachkanal.").await;
    }

    ctx.say("🔄 Erstelle Nachrichten...").await?;
    let text = radio.announcer.compose().await;
    radio.announce_now(text).await;
    ctx.say("🎙️ Spezialsendung in Kürze.").await?;
    Ok(())
}
