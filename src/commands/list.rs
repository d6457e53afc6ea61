use poise::CreateReply;
use serenity::builder::CreateAttachment;

use super::ensure_admin;
use crate::utils::embed;
use crate::{Context, Error};

const MESSAGE_LIMIT: usize = 1900;

/// Zeigt die Wiedergabeliste (Admin)
#[poise::command(prefix_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_admin(ctx).await? {
        return Ok(());
    }

    let entries = ctx.data().radio.lock().await.playlist.entries().to_vec();
    if entries.is_empty() {
        ctx.say("📂 Die Wiedergabeliste ist leer.").await?;
        return Ok(());
    }

    match embed::playlist_block(&entries, MESSAGE_LIMIT) {
        Some(block) => {
            ctx.say(block).await?;
        }
        None => {
            let file = CreateAttachment::bytes(entries.join("\n").into_bytes(), "playlist.txt");
            ctx.send(
                CreateReply::default()
                    .content("📂 Die Liste ist zu lang, hier als Datei:")
                    .attachment(file),
            )
            .await?;
        }
    }
    Ok(())
}
