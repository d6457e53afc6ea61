mod addsong;
mod ballot;
mod coment;
mod delete;
mod deutschland;
mod help;
mod join;
mod list;
mod play;
mod skip;

use poise::CreateReply;

use crate::utils::{embed, voice};
use crate::{Context, Data, Error};

pub use ballot::ChatBallot;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        help::help(),
        join::join(),
        play::play(),
        skip::skip(),
        addsong::addsong(),
        delete::delete(),
        list::list(),
        coment::coment(),
        deutschland::deutschland(),
    ]
}

/// Replies `⛔` and returns false for anyone but the admin.
async fn ensure_admin(ctx: Context<'_>) -> Result<bool, Error> {
    if ctx.data().is_admin(ctx.author()) {
        return Ok(true);
    }
    ctx.send(CreateReply::default().embed(embed::denied()))
        .await?;
    Ok(false)
}

async fn reply_error(ctx: Context<'_>, message: &str) -> Result<(), Error> {
    ctx.send(CreateReply::default().embed(embed::error(message)))
        .await?;
    Ok(())
}

/// Listener count of the bot's channel, if the author sits in it too.
async fn shared_channel_listeners(ctx: Context<'_>) -> Result<Option<usize>, Error> {
    let Some(bot_channel) = ctx.data().radio.channel().await else {
        return Ok(None);
    };

    let guild = ctx.guild().ok_or("guild missing from cache")?;
    let author_channel = voice::user_channel(&guild, ctx.author().id);
    Ok((author_channel == Some(bot_channel)).then(|| voice::listeners_in(&guild, bot_channel)))
}
