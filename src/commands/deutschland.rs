use tracing::error;

use super::{ensure_admin, reply_error};
use crate::radio::broadcast;
use crate::{Context, Error};

/// Spielt die Tagessendung sofort ab (Admin)
#[poise::command(prefix_command, guild_only)]
pub async fn deutschland(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_admin(ctx).await? {
        return Ok(());
    }

    let data = ctx.data();
    match broadcast::run(ctx.serenity_context(), &data.radio, &data.config).await {
        Ok(()) => {
            ctx.say("🇩🇪 Sendung startet.").await?;
        }
        Err(e) => {
            error!("manual broadcast failed: {e}");
            reply_error(ctx, &format!("Sendung fehlgeschlagen: {e}")).await?;
        }
    }
    Ok(())
}
