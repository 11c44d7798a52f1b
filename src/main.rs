// This is the entry point of the anonymous submission bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): submission lifecycle and
//   the scheduled publisher
// - `infra/` = Implementations of core traits (SQLite store)
// - `discord/` = Discord-specific adapters (commands, channel delivery)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and start the publisher
// 4. Shut both down cleanly on Ctrl-C

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::Settings;
use crate::core::publishing::PublishScheduler;
use crate::core::submissions::SubmissionService;
use crate::discord::commands::presence;
use crate::discord::{Data, DiscordChannelPublisher, Error, ModeratorAllowList};
use crate::infra::submissions::SqliteSubmissionStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // RUST_LOG wins; LOG_LEVEL is the simple knob for deployments.
    let fallback = std::env::var("LOG_LEVEL")
        .map(|level| level.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env().context("Invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One store handle, opened once and shared by the commands and the
    // publisher.

    let store = SqliteSubmissionStore::connect(&settings.database_url)
        .await
        .context("Failed to open the submission database")?;
    let submissions = Arc::new(SubmissionService::new(store));
    submissions
        .ping()
        .await
        .context("Submission database failed its liveness check")?;

    let moderators = ModeratorAllowList::new(settings.moderator_ids.iter().copied());
    tracing::info!(moderators = %moderators.describe(), "Moderator allow-list loaded");

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Slash commands only, so no privileged intents are needed.
    let intents = serenity::GatewayIntents::non_privileged();

    let publish_channel = settings.publish_channel;
    let command_submissions = Arc::clone(&submissions);

    let framework = poise::Framework::<Data, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::submit::submit(),
                discord::commands::help::help(),
                discord::moderation::commands::pending(),
                discord::moderation::commands::latest(),
                discord::moderation::commands::approve(),
                discord::moderation::commands::reject(),
                discord::moderation::commands::publish(),
            ],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                presence::on_ready(ctx);
                tracing::info!(bot = %ready.user.name, "Bot is ready, commands registered");

                Ok(Data {
                    submissions: command_submissions,
                    publisher: Arc::new(DiscordChannelPublisher::new(ctx.http.clone())),
                    publish_channel,
                    moderators,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    // ========================================================================
    // BACKGROUND PUBLISHER
    // ========================================================================

    let shutdown = CancellationToken::new();
    let scheduler = PublishScheduler::new(
        Arc::clone(&submissions),
        Arc::new(DiscordChannelPublisher::new(client.http.clone())),
        settings.scheduler_config(),
    );
    let scheduler_handle = scheduler.spawn(shutdown.clone());

    let shard_manager = client.shard_manager.clone();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal_shutdown.cancel();
                shard_manager.shutdown_all().await;
            }
            Err(err) => tracing::warn!("Unable to listen for shutdown signal: {}", err),
        }
    });

    let result = client.start().await;

    // Lets an in-flight batch finish before the process exits.
    shutdown.cancel();
    if let Some(handle) = scheduler_handle {
        if let Err(err) = handle.await {
            tracing::error!("Publisher task ended abnormally: {}", err);
        }
    }

    result.context("Error running bot")?;
    Ok(())
}
