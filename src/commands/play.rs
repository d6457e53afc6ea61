use poise::CreateReply;
use tracing::warn;

use super::{reply_error, shared_channel_listeners, ChatBallot};
use crate::radio::vote::{self, VoteError, ADD_EMOJI, VOTE_WINDOW};
use crate::utils::embed;
use crate::{Context, Error};

/// Schlägt einen Song für die sofortige Wiedergabe vor
#[poise::command(prefix_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[rest]
    #[description = "Songtitel oder URL"]
    reference: String,
) -> Result<(), Error> {
    let radio = &ctx.data().radio;

    if radio.votes.is_active() {
        return reply_error(ctx, "⚠️ Eine Abstimmung läuft bereits.").await;
    }

    let Some(listeners) = shared_channel_listeners(ctx).await? else {
        return reply_error(ctx, "⚠️ Du musst im gleichen Sprachkanal sein.").await;
    };

    if ctx.data().is_admin(ctx.author()) {
        radio.play_next(reference.clone()).await;
        ctx.say(format!("✅ Akzeptiert: {reference}")).await?;
        return Ok(());
    }

    let ballot = ChatBallot::new(ctx.serenity_context().clone(), ctx.channel_id());
    let prompt = |required: usize| {
        format!(
            "🗳️ **Abstimmung für neuen Song!**\n{reference}\n\
             Benötigte Stimmen: **{required}**\n\
             Reagiere mit {ADD_EMOJI} um zuzustimmen (60s)."
        )
    };

    match vote::conduct(&radio.votes, &ballot, listeners, ADD_EMOJI, prompt, VOTE_WINDOW).await {
        Ok(vote::VoteOutcome::Immediate) => {
            radio.play_next(reference.clone()).await;
            ctx.say(format!("✅ Akzeptiert: {reference}")).await?;
        }
        Ok(outcome) => {
            if outcome.approved() {
                radio.play_next(reference.clone()).await;
            }
            ctx.send(CreateReply::default().embed(embed::vote_result("Song hinzugefügt", outcome)))
                .await?;
        }
        Err(VoteError::AlreadyActive) => {
            reply_error(ctx, "⚠️ Eine Abstimmung läuft bereits.").await?;
        }
        Err(e) => warn!("song vote for '{reference}' aborted: {e}"),
    }

    Ok(())
}
