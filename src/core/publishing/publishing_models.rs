// Publishing domain models - configuration, loop states and errors for the
// scheduled publisher.

use crate::core::submissions::{Submission, SubmissionError, SubmissionStatus};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// How many approved submissions one cycle drains when nothing else is set.
pub const DEFAULT_BATCH_LIMIT: u32 = 20;

/// Used in place of a zero cooldown so failed cycles never retry back to back.
const MIN_COOLDOWN: Duration = Duration::from_secs(1);

// ============================================================================
// ERRORS
// ============================================================================

/// The channel refused or failed to take a message.
#[derive(Debug, Error)]
#[error("Delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Anything that aborts a publish cycle or a manual publish.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Storage(#[from] SubmissionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

// ============================================================================
// CONFIG
// ============================================================================

/// Fixed at startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between cycles. Zero disables the publisher.
    pub interval: Duration,
    /// Max submissions delivered per cycle.
    pub batch_limit: u32,
    /// Channel to publish into. `None` disables the publisher.
    pub destination: Option<u64>,
    /// Pause after the first failed cycle.
    pub cooldown: Duration,
    /// Upper bound for the doubling cooldown on consecutive failures.
    pub max_cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            batch_limit: DEFAULT_BATCH_LIMIT,
            destination: None,
            cooldown: Duration::from_secs(5),
            max_cooldown: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// The destination to publish into, or `None` when the publisher must
    /// not run at all.
    pub fn destination_if_enabled(&self) -> Option<u64> {
        if self.interval.is_zero() {
            None
        } else {
            self.destination
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.destination_if_enabled().is_some()
    }

    /// Cooldown after `consecutive_failures` failed cycles in a row:
    /// `cooldown * 2^(n-1)`, never above `max_cooldown`. A zero `cooldown`
    /// counts as one second.
    pub fn cooldown_after(&self, consecutive_failures: u32) -> Duration {
        let base = if self.cooldown.is_zero() {
            MIN_COOLDOWN
        } else {
            self.cooldown
        };
        let exponent = consecutive_failures.saturating_sub(1).min(16);
        let ceiling = self.max_cooldown.max(base);
        base.saturating_mul(1u32 << exponent).min(ceiling)
    }
}

// ============================================================================
// LOOP STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started (or disabled).
    Idle,
    /// Sleeping between cycles.
    Waiting,
    /// Selecting and delivering a batch. Not interruptible.
    Draining,
    /// Sleeping after a failed cycle.
    Cooldown,
    /// Cancelled. Terminal.
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Waiting => "waiting",
            SchedulerState::Draining => "draining",
            SchedulerState::Cooldown => "cooldown",
            SchedulerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Result of delivering one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Delivered and marked published.
    Published,
    /// Delivered, but another writer had already moved the submission on.
    AlreadyMoved,
}

/// Whether a submission can be published by hand right now.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishCandidate {
    /// Approved (possibly just now) and ready to deliver.
    Ready(Submission),
    NotFound,
    /// Rejected or already published.
    Refused(SubmissionStatus),
    /// Another writer moved it while it was being approved.
    Changed,
}

/// Result of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was approved.
    Empty,
    Drained { published: usize, already_moved: usize },
}
