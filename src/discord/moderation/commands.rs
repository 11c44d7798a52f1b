// Moderation slash commands: review the queue and move submissions along.
//
// Thin layer: check the caller, call the submission service, render the
// answer. Replies are ephemeral so unreviewed text never shows up in public.

use crate::core::publishing::{
    publish_submission, select_for_publish, PublishCandidate, PublishError, PublishOutcome,
};
use crate::core::submissions::{Submission, SubmissionError, SubmissionStatus};
use crate::discord::formatter::{format_submission_list, split_message, DISCORD_MESSAGE_LIMIT};
use crate::discord::{Context, Error};

const PENDING_PAGE_SIZE: u32 = 20;
const LATEST_PAGE_SIZE: u32 = 10;

async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Send long content as several ephemeral messages.
async fn reply_chunked(ctx: Context<'_>, content: &str) -> Result<(), Error> {
    for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
        reply(ctx, chunk).await?;
    }
    Ok(())
}

/// Answers "access denied" and returns `false` for anyone off the allow-list.
async fn ensure_moderator(ctx: Context<'_>) -> Result<bool, Error> {
    let user_id = ctx.author().id.get();
    if ctx.data().moderators.permits(user_id) {
        return Ok(true);
    }

    tracing::warn!(
        user_id,
        command = %ctx.command().name,
        "Moderation command refused for user outside the allow-list"
    );
    reply(ctx, "⛔️ Access denied.").await?;
    Ok(false)
}

async fn storage_unavailable(ctx: Context<'_>, err: SubmissionError) -> Result<(), Error> {
    tracing::error!(error = %err, command = %ctx.command().name, "Submission store unavailable");
    reply(
        ctx,
        "⚠️ The submission store is unavailable right now. Please try again.",
    )
    .await
}

async fn show_list(ctx: Context<'_>, items: Vec<Submission>, empty: &str) -> Result<(), Error> {
    if items.is_empty() {
        return reply(ctx, empty).await;
    }
    reply_chunked(ctx, &format_submission_list(&items)).await
}

/// Show the newest submissions waiting for review.
#[poise::command(slash_command)]
pub async fn pending(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_moderator(ctx).await? {
        return Ok(());
    }

    match ctx.data().submissions.list_pending(PENDING_PAGE_SIZE).await {
        Ok(items) => show_list(ctx, items, "Queue is empty ✅").await,
        Err(e) => storage_unavailable(ctx, e).await,
    }
}

/// Show the most recent submissions of any status.
#[poise::command(slash_command)]
pub async fn latest(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_moderator(ctx).await? {
        return Ok(());
    }

    match ctx.data().submissions.list_recent(LATEST_PAGE_SIZE).await {
        Ok(items) => show_list(ctx, items, "No submissions yet.").await,
        Err(e) => storage_unavailable(ctx, e).await,
    }
}

/// Approve a pending submission for the publishing queue.
#[poise::command(slash_command)]
pub async fn approve(
    ctx: Context<'_>,
    #[description = "Submission id"] id: String,
) -> Result<(), Error> {
    change_status(ctx, &id, SubmissionStatus::Approved, "Approved ✅").await
}

/// Reject a pending submission.
#[poise::command(slash_command)]
pub async fn reject(
    ctx: Context<'_>,
    #[description = "Submission id"] id: String,
) -> Result<(), Error> {
    change_status(ctx, &id, SubmissionStatus::Rejected, "Rejected ✅").await
}

async fn change_status(
    ctx: Context<'_>,
    id: &str,
    status: SubmissionStatus,
    done: &str,
) -> Result<(), Error> {
    if !ensure_moderator(ctx).await? {
        return Ok(());
    }

    let submissions = &ctx.data().submissions;
    match submissions.set_status(id, status).await {
        Ok(true) => reply(ctx, format!("{done} `{}`", id.trim())).await,
        // Tell the moderator why nothing changed.
        Ok(false) => match submissions.get(id).await {
            Ok(None) => reply(ctx, "Submission not found.").await,
            Ok(Some(current)) if current.status.is_terminal() => {
                reply(ctx, format!("Submission is already {}.", current.status)).await
            }
            Ok(Some(current)) => {
                reply(
                    ctx,
                    format!(
                        "Submission is {} and can't be moved to {}.",
                        current.status, status
                    ),
                )
                .await
            }
            Err(e) => storage_unavailable(ctx, e).await,
        },
        Err(e) => storage_unavailable(ctx, e).await,
    }
}

/// Publish a submission to the channel right away.
///
/// Pending submissions are approved first. If delivery fails the submission
/// stays approved and the scheduled publisher will pick it up later.
#[poise::command(slash_command)]
pub async fn publish(
    ctx: Context<'_>,
    #[description = "Submission id"] id: String,
) -> Result<(), Error> {
    if !ensure_moderator(ctx).await? {
        return Ok(());
    }

    let data = ctx.data();
    let Some(channel_id) = data.publish_channel else {
        return reply(ctx, "CHANNEL_ID is not configured.").await;
    };

    let submission = match select_for_publish(data.submissions.as_ref(), &id).await {
        Ok(PublishCandidate::Ready(submission)) => submission,
        Ok(PublishCandidate::NotFound) => return reply(ctx, "Submission not found.").await,
        Ok(PublishCandidate::Refused(status)) => {
            return reply(ctx, format!("Submission is {status} and can't be published.")).await
        }
        Ok(PublishCandidate::Changed) => {
            return reply(
                ctx,
                "Submission changed while publishing. Check `/latest` and try again.",
            )
            .await
        }
        Err(e) => return storage_unavailable(ctx, e).await,
    };

    // Delivery can outlast Discord's three-second reply window.
    ctx.defer_ephemeral().await?;

    match publish_submission(
        data.submissions.as_ref(),
        data.publisher.as_ref(),
        channel_id,
        &submission,
    )
    .await
    {
        Ok(PublishOutcome::Published) => {
            reply(ctx, format!("Published: `{}` ✅", submission.id)).await
        }
        Ok(PublishOutcome::AlreadyMoved) => {
            reply(
                ctx,
                "Delivered, but the submission had already been moved on by someone else.",
            )
            .await
        }
        Err(PublishError::Delivery(e)) => {
            tracing::warn!(submission_id = %submission.id, error = %e, "Manual publish failed");
            reply(
                ctx,
                format!("Couldn't post to the channel ({e}). The submission stays approved."),
            )
            .await
        }
        Err(PublishError::Storage(e)) => storage_unavailable(ctx, e).await,
    }
}
