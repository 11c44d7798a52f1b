// Discord layer - commands, formatting and channel delivery.

use crate::core::submissions::SubmissionService;
use crate::infra::submissions::SqliteSubmissionStore;
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "formatting/submission_formatter.rs"]
pub mod formatter;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "publishing/channel_publisher.rs"]
pub mod publishing;

pub use moderation::ModeratorAllowList;
pub use publishing::DiscordChannelPublisher;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared across all command invocations.
pub struct Data {
    pub submissions: Arc<SubmissionService<SqliteSubmissionStore>>,
    pub publisher: Arc<DiscordChannelPublisher>,
    /// Where `/publish` posts. `None` disables manual publishing.
    pub publish_channel: Option<u64>,
    pub moderators: ModeratorAllowList,
}
