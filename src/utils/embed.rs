use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::radio::vote::VoteOutcome;

pub fn error(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Fehler")
        .description(message)
        .color(0xED4245)
}

pub fn denied() -> CreateEmbed {
    CreateEmbed::new()
        .title("⛔ Zugriff verweigert.")
        .color(0xED4245)
}

pub fn vote_result(action: &str, outcome: VoteOutcome) -> CreateEmbed {
    match outcome {
        VoteOutcome::Immediate => CreateEmbed::new()
            .title(format!("✅ {action}"))
            .color(0x1DB954),
        VoteOutcome::Passed { count, required } => CreateEmbed::new()
            .title(format!("✅ {action} erfolgreich"))
            .footer(CreateEmbedFooter::new(format!("{count}/{required} Stimmen")))
            .color(0x1DB954),
        VoteOutcome::Failed { count, required } => CreateEmbed::new()
            .title(format!("❌ {action} gescheitert"))
            .footer(CreateEmbedFooter::new(format!("{count}/{required} Stimmen")))
            .color(0xED4245),
    }
}

/// Fits the playlist in one message, or `None` when it needs an attachment.
pub fn playlist_block(entries: &[String], limit: usize) -> Option<String> {
    let content = entries.join("\n");
    (content.chars().count() <= limit).then(|| format!("📂 **Wiedergabeliste**:\n```{content}```"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_block_fits() {
        let entries = vec!["Song A".to_string(), "Song B".to_string()];
        assert_eq!(
            playlist_block(&entries, 1900).unwrap(),
            "📂 **Wiedergabeliste**:\n```Song A\nSong B```"
        );
    }

    #[test]
    fn test_playlist_block_too_long() {
        let entries = vec!["x".repeat(1901)];
        assert!(playlist_block(&entries, 1900).is_none());
    }
}
