use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

struct CommandHelp {
    usage: &'static str,
    description: &'static str,
}

const SUBMITTER_COMMANDS: &[CommandHelp] = &[CommandHelp {
    usage: "/submit <text> [lang]",
    description: "Send an anonymous submission for review.",
}];

const MODERATOR_COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        usage: "/pending",
        description: "Newest submissions waiting for review.",
    },
    CommandHelp {
        usage: "/latest",
        description: "Most recent submissions of any status.",
    },
    CommandHelp {
        usage: "/approve <id>",
        description: "Queue a pending submission for the scheduled publisher.",
    },
    CommandHelp {
        usage: "/reject <id>",
        description: "Reject a pending submission.",
    },
    CommandHelp {
        usage: "/publish <id>",
        description: "Post a submission to the channel now.",
    },
];

fn render(commands: &[CommandHelp]) -> String {
    commands
        .iter()
        .map(|c| format!("`{}` - {}", c.usage, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// List the bot's commands.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("📮 Anonymous submission box")
        .color(serenity::Colour::BLURPLE)
        .field("Everyone", render(SUBMITTER_COMMANDS), false)
        .field("Moderators", render(MODERATOR_COMMANDS), false)
        .footer(serenity::CreateEmbedFooter::new(
            "Only whitelisted moderators can manage submissions.",
        ));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
