use tracing::error;

use super::{ensure_admin, reply_error};
use crate::{Context, Error};

/// Entfernt alle Songs, die den Suchbegriff enthalten (Admin)
#[poise::command(prefix_command, guild_only)]
pub async fn delete(
    ctx: Context<'_>,
    #[rest]
    #[description = "Suchbegriff"]
    query: String,
) -> Result<(), Error> {
    if !ensure_admin(ctx).await? {
        return Ok(());
    }

    let query = query.trim();
    if query.is_empty() {
        return reply_error(ctx, "⚠️ Bitte einen Suchbegriff angeben.").await;
    }

    let removed = ctx.data().radio.lock().await.playlist.remove(query);
    match removed {
        Ok(0) => {
            ctx.say(format!("⚠️ Keine Songs gefunden für '{query}'."))
                .await?;
        }
        Ok(count) => {
            ctx.say(format!("🗑️ {count} Song(s) entfernt, die '{query}' enthielten."))
                .await?;
        }
        Err(e) => {
            error!("{e}");
            reply_error(ctx, "Wiedergabeliste konnte nicht gespeichert werden.").await?;
        }
    }
    Ok(())
}
