use std::sync::OnceLock;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, MessageId};

use crate::radio::vote::Ballot;
use crate::Error;

/// A vote as a chat message the bot seeds with its own reaction.
pub struct ChatBallot {
    ctx: serenity::Context,
    channel_id: ChannelId,
    message_id: OnceLock<MessageId>,
}

impl ChatBallot {
    pub fn new(ctx: serenity::Context, channel_id: ChannelId) -> Self {
        Self {
            ctx,
            channel_id,
            message_id: OnceLock::new(),
        }
    }
}

#[async_trait]
impl Ballot for ChatBallot {
    async fn open(&self, prompt: &str, emoji: &str) -> Result<(), Error> {
        let message = self.channel_id.say(&self.ctx, prompt).await?;
        message
            .react(&self.ctx, ReactionType::Unicode(emoji.to_string()))
            .await?;
        let _ = self.message_id.set(message.id);
        Ok(())
    }

    async fn count(&self, emoji: &str) -> Result<usize, Error> {
        let id = *self.message_id.get().ok_or("vote message was never posted")?;
        let message = self.channel_id.message(&self.ctx, id).await?;
        Ok(matching_count(
            message
                .reactions
                .iter()
                .map(|r| (&r.reaction_type, r.count)),
            emoji,
        ))
    }
}

/// Reaction total for `emoji`, ignoring emoji variation selectors.
pub fn matching_count<'a>(
    reactions: impl IntoIterator<Item = (&'a ReactionType, u64)>,
    emoji: &str,
) -> usize {
    let wanted = emoji.trim_end_matches('\u{fe0f}');
    reactions
        .into_iter()
        .filter(|(kind, _)| {
            matches!(kind, ReactionType::Unicode(name) if name.trim_end_matches('\u{fe0f}') == wanted)
        })
        .map(|(_, count)| count as usize)
        .sum()
}
