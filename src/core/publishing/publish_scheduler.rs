// Scheduled publisher - drains approved submissions into the public channel.
//
// All progress lives in the submission status, so the loop itself is
// stateless and safe to restart. Delivery always happens before the status
// flips to published, which makes delivery at-least-once: if the status write
// fails after a successful send, the item goes out again next cycle.

use super::publishing_models::{
    CycleOutcome, DeliveryError, PublishCandidate, PublishError, PublishOutcome, SchedulerConfig,
    SchedulerState,
};
use crate::core::submissions::{
    Submission, SubmissionError, SubmissionService, SubmissionStatus, SubmissionStore,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ============================================================================
// CHANNEL TRAIT (PORT)
// ============================================================================

/// Something that can post text into a channel.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Turn a submission into the payload for this channel's markup.
    fn render(&self, submission: &Submission) -> String;

    async fn deliver(&self, destination: u64, text: &str) -> Result<(), DeliveryError>;
}

/// Lets the scheduler and the command handlers share one publisher.
#[async_trait]
impl<T: ChannelPublisher + ?Sized> ChannelPublisher for Arc<T> {
    fn render(&self, submission: &Submission) -> String {
        (**self).render(submission)
    }

    async fn deliver(&self, destination: u64, text: &str) -> Result<(), DeliveryError> {
        (**self).deliver(destination, text).await
    }
}

/// Deliver one submission and mark it published.
///
/// Shared by the scheduler and the manual `/publish` command. The status is
/// only touched after delivery succeeded.
pub async fn publish_submission<S, P>(
    submissions: &SubmissionService<S>,
    publisher: &P,
    destination: u64,
    submission: &Submission,
) -> Result<PublishOutcome, PublishError>
where
    S: SubmissionStore,
    P: ChannelPublisher + ?Sized,
{
    let payload = publisher.render(submission);
    publisher.deliver(destination, &payload).await?;

    if submissions.mark_published(submission.id).await? {
        tracing::info!(submission_id = %submission.id, channel_id = destination, "Published submission");
        Ok(PublishOutcome::Published)
    } else {
        tracing::warn!(
            submission_id = %submission.id,
            "Delivered submission was no longer approved; another writer moved it first"
        );
        Ok(PublishOutcome::AlreadyMoved)
    }
}

/// Prepare a submission for a manual publish.
///
/// Approved submissions are ready as they are. Pending ones are approved
/// first, so a failed delivery leaves them approved for the scheduler.
pub async fn select_for_publish<S: SubmissionStore>(
    submissions: &SubmissionService<S>,
    id: &str,
) -> Result<PublishCandidate, SubmissionError> {
    let Some(submission) = submissions.get(id).await? else {
        return Ok(PublishCandidate::NotFound);
    };

    if submission.status.can_transition_to(SubmissionStatus::Published) {
        return Ok(PublishCandidate::Ready(submission));
    }
    if !submission.status.can_transition_to(SubmissionStatus::Approved) {
        return Ok(PublishCandidate::Refused(submission.status));
    }

    let approved = submissions
        .set_status(&submission.id.to_string(), SubmissionStatus::Approved)
        .await?;
    if approved {
        Ok(PublishCandidate::Ready(Submission {
            status: SubmissionStatus::Approved,
            ..submission
        }))
    } else {
        Ok(PublishCandidate::Changed)
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

pub struct PublishScheduler<S: SubmissionStore, P: ChannelPublisher> {
    submissions: Arc<SubmissionService<S>>,
    publisher: P,
    config: SchedulerConfig,
    state: watch::Sender<SchedulerState>,
}

impl<S, P> PublishScheduler<S, P>
where
    S: SubmissionStore + 'static,
    P: ChannelPublisher + 'static,
{
    pub fn new(submissions: Arc<SubmissionService<S>>, publisher: P, config: SchedulerConfig) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            submissions,
            publisher,
            config,
            state,
        }
    }

    /// Observe loop state changes.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Start the loop on the runtime. Returns `None` (and starts nothing)
    /// when the publisher is disabled.
    pub fn spawn(self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if !self.config.is_enabled() {
            tracing::info!("Publisher disabled: set CHANNEL_ID and a non-zero POLL_INTERVAL to enable");
            return None;
        }
        Some(tokio::spawn(self.run(shutdown)))
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation cuts a pending sleep short but never a batch that is
    /// already draining. Failed cycles are logged and retried after a
    /// cooldown; they never end the loop.
    pub async fn run(self, shutdown: CancellationToken) {
        let Some(destination) = self.config.destination_if_enabled() else {
            return;
        };

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            batch_limit = self.config.batch_limit,
            channel_id = destination,
            "Publisher enabled"
        );

        let mut consecutive_failures: u32 = 0;

        while !shutdown.is_cancelled() {
            self.enter(SchedulerState::Draining);

            let (pause, cooling) = match self.run_cycle(destination).await {
                Ok(outcome) => {
                    consecutive_failures = 0;
                    if let CycleOutcome::Drained {
                        published,
                        already_moved,
                    } = outcome
                    {
                        tracing::info!(published, already_moved, "Publish cycle finished");
                    }
                    self.enter(SchedulerState::Waiting);
                    (self.config.interval, false)
                }
                Err(err) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    let cooldown = self.config.cooldown_after(consecutive_failures);
                    tracing::error!(
                        error = %err,
                        consecutive_failures,
                        cooldown_ms = cooldown.as_millis() as u64,
                        "Publish cycle failed; retrying after cooldown"
                    );
                    self.enter(SchedulerState::Cooldown);
                    (cooldown, true)
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }

            // A finished cooldown hands back to the regular schedule.
            if cooling {
                self.enter(SchedulerState::Waiting);
            }
        }

        self.enter(SchedulerState::Stopped);
        tracing::info!("Publisher stopped");
    }

    /// One select-deliver-mark pass over at most `batch_limit` approved
    /// submissions, oldest first. The first failure aborts the pass; items
    /// already published stay published.
    pub async fn run_cycle(&self, destination: u64) -> Result<CycleOutcome, PublishError> {
        let batch = self
            .submissions
            .list_approved_fifo(self.config.batch_limit.max(1))
            .await?;

        if batch.is_empty() {
            tracing::debug!("No approved submissions to publish");
            return Ok(CycleOutcome::Empty);
        }

        let mut published = 0;
        let mut already_moved = 0;
        for submission in &batch {
            match publish_submission(self.submissions.as_ref(), &self.publisher, destination, submission)
                .await?
            {
                PublishOutcome::Published => published += 1,
                PublishOutcome::AlreadyMoved => already_moved += 1,
            }
        }

        Ok(CycleOutcome::Drained {
            published,
            already_moved,
        })
    }

    fn enter(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Publisher state changed");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
