use poise::CreateReply;
use tracing::warn;

use super::{reply_error, shared_channel_listeners, ChatBallot};
use crate::radio::vote::{self, VoteError, VoteOutcome, SKIP_EMOJI, VOTE_WINDOW};
use crate::utils::embed;
use crate::{Context, Error};

/// Stimmt über das Überspringen des aktuellen Songs ab
#[poise::command(prefix_command, guild_only)]
pub async fn skip(ctx: Context<'_>) -> Result<(), Error> {
    let radio = &ctx.data().radio;

    if radio.votes.is_active() {
        return reply_error(ctx, "⚠️ Abstimmung läuft bereits.").await;
    }

    let listeners = if radio.is_playing().await {
        shared_channel_listeners(ctx).await?
    } else {
        None
    };
    let Some(listeners) = listeners else {
        return reply_error(ctx, "⚠️ Bot spielt nicht oder falscher Kanal.").await;
    };

    if ctx.data().is_admin(ctx.author()) {
        radio.stop_current().await;
        ctx.say("⏭️ (Admin) Übersprungen.").await?;
        return Ok(());
    }

    let ballot = ChatBallot::new(ctx.serenity_context().clone(), ctx.channel_id());
    let prompt = |required: usize| {
        format!("🗳️ Skip Vote! Benötigt: **{required}**\nReagiere mit {SKIP_EMOJI} (60s).")
    };

    match vote::conduct(&radio.votes, &ballot, listeners, SKIP_EMOJI, prompt, VOTE_WINDOW).await {
        Ok(VoteOutcome::Immediate) => {
            radio.stop_current().await;
            ctx.say("⏭️ Übersprungen.").await?;
        }
        Ok(outcome) => {
            if outcome.approved() {
                radio.stop_current().await;
            }
            ctx.send(CreateReply::default().embed(embed::vote_result("Skip", outcome)))
                .await?;
        }
        Err(VoteError::AlreadyActive) => {
            reply_error(ctx, "⚠️ Abstimmung läuft bereits.").await?;
        }
        Err(e) => warn!("skip vote aborted: {e}"),
    }

    Ok(())
}
