use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::{Context, Error};

fn help_text(prefix: &str) -> (String, String) {
    let everyone = format!(
        "\
`{prefix}join` — Tritt deinem Sprachkanal bei
`{prefix}play <Song/URL>` — Song vorschlagen (Abstimmung)
`{prefix}skip` — Aktuellen Song überspringen (Abstimmung)
`{prefix}help` — Diese Hilfe"
    );
    let admin = format!(
        "\
`{prefix}addsong <Song/URL>` — Song zur Liste hinzufügen
`{prefix}delete <Begriff>` — Songs aus der Liste entfernen
`{prefix}list` — Wiedergabeliste anzeigen
`{prefix}coment` — Wetter und Nachrichten sofort
`{prefix}deutschland` — Tagessendung sofort"
    );
    (everyone, admin)
}

/// Zeigt alle Befehle
#[poise::command(prefix_command, guild_only)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let (everyone, admin) = help_text(&ctx.data().config.prefix);

    let embed = CreateEmbed::new()
        .title("📻 Radio Hilfe")
        .field("Alle", everyone, false)
        .field("Admin", admin, false)
        .color(0x5865F2);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_uses_prefix() {
        let (everyone, admin) = help_text(":");
        assert!(everyone.contains("`:play <Song/URL>`"));
        assert!(admin.contains("`:deutschland`"));
    }
}
