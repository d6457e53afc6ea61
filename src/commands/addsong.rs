use tracing::{error, info};

use super::{ensure_admin, reply_error};
use crate::{Context, Error};

/// Fügt einen Song dauerhaft zur Wiedergabeliste hinzu (Admin)
#[poise::command(prefix_command, guild_only)]
pub async fn addsong(
    ctx: Context<'_>,
    #[rest]
    #[description = "Songtitel oder URL"]
    entry: String,
) -> Result<(), Error> {
    if !ensure_admin(ctx).await? {
        return Ok(());
    }

    let entry = entry.trim();
    if entry.is_empty() {
        return reply_error(ctx, "⚠️ Bitte einen Song angeben.").await;
    }

    let added = ctx.data().radio.lock().await.playlist.add(entry);
    match added {
        Ok(total) => {
            info!("playlist now holds {total} entries");
            ctx.say(format!("✅ Gespeichert: {entry}")).await?;
        }
        Err(e) => {
            error!("{e}");
            reply_error(ctx, "Wiedergabeliste konnte nicht gespeichert werden.").await?;
        }
    }
    Ok(())
}
