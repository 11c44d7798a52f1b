// Anonymous intake. The author's identity is never stored or logged.

use crate::discord::{Context, Error};

/// Send an anonymous submission to the moderators.
#[poise::command(slash_command)]
pub async fn submit(
    ctx: Context<'_>,
    #[description = "What do you want to share?"] text: String,
    #[description = "Language tag, e.g. en (default: en)"]
    #[max_length = 16]
    lang: Option<String>,
) -> Result<(), Error> {
    let reply = if text.trim().is_empty() {
        "Submission text can't be empty.".to_string()
    } else {
        match ctx.data().submissions.submit(&text, lang.as_deref()).await {
            Ok(id) => format!("Thanks! Your submission `{id}` is waiting for review. 📨"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to store submission");
                "⚠️ Couldn't save your submission right now. Please try again.".to_string()
            }
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}
