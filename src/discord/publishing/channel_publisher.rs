// Discord delivery for the publisher. Adapts the core ChannelPublisher port
// onto serenity's HTTP client.

use crate::core::publishing::{ChannelPublisher, DeliveryError};
use crate::core::submissions::Submission;
use crate::discord::formatter::{format_announcement, split_message, DISCORD_MESSAGE_LIMIT};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Posts submissions into a Discord text channel.
#[derive(Clone)]
pub struct DiscordChannelPublisher {
    http: Arc<serenity::Http>,
}

impl DiscordChannelPublisher {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelPublisher for DiscordChannelPublisher {
    fn render(&self, submission: &Submission) -> String {
        format_announcement(submission)
    }

    async fn deliver(&self, destination: u64, text: &str) -> Result<(), DeliveryError> {
        if destination == 0 {
            return Err(DeliveryError("channel id 0 is not a valid channel".to_string()));
        }
        let channel_id = serenity::ChannelId::new(destination);

        for chunk in split_message(text, DISCORD_MESSAGE_LIMIT) {
            // Submitted text must never ping anyone or unfurl links.
            let message = serenity::CreateMessage::new()
                .content(chunk)
                .allowed_mentions(serenity::CreateAllowedMentions::new())
                .flags(serenity::MessageFlags::SUPPRESS_EMBEDS);

            channel_id
                .send_message(self.http.as_ref(), message)
                .await
                .map_err(|e| DeliveryError(e.to_string()))?;
        }

        Ok(())
    }
}
