// Submission lifecycle - the façade both the slash commands and the
// background publisher go through.
//
// NO Discord dependencies here - just the status rules and queries.

use super::submission_models::{
    normalize_lang, SortOrder, Submission, SubmissionId, SubmissionStatus,
};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Infrastructure failures only. "Not found" is never an error.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Durable collection of submissions.
///
/// Implementations must index `(status, created_at)` and `created_at`, and
/// break `created_at` ties by insertion order.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new pending submission and return its id.
    async fn insert(&self, text: &str, lang: &str) -> Result<SubmissionId, SubmissionError>;

    /// Up to `limit` submissions with the given status (any status when
    /// `None`), sorted by `created_at` in `order`.
    async fn find_by_status(
        &self,
        status: Option<SubmissionStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Submission>, SubmissionError>;

    async fn find_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, SubmissionError>;

    /// Set `status = new` only where the stored status is still `expected`.
    /// Returns whether exactly one submission was modified.
    async fn compare_and_set_status(
        &self,
        id: SubmissionId,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<bool, SubmissionError>;

    /// Liveness probe, checked once before the bot reports ready.
    async fn ping(&self) -> Result<(), SubmissionError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct SubmissionService<S: SubmissionStore> {
    store: S,
}

impl<S: SubmissionStore> SubmissionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Accept a new anonymous submission. It always starts out pending.
    pub async fn submit(
        &self,
        text: &str,
        lang: Option<&str>,
    ) -> Result<SubmissionId, SubmissionError> {
        let lang = normalize_lang(lang);
        let id = self.store.insert(text, &lang).await?;
        tracing::info!(submission_id = %id, lang = %lang, "New submission queued");
        Ok(id)
    }

    /// Pending submissions for review, newest first.
    pub async fn list_pending(&self, limit: u32) -> Result<Vec<Submission>, SubmissionError> {
        self.store
            .find_by_status(Some(SubmissionStatus::Pending), SortOrder::NewestFirst, limit)
            .await
    }

    /// Most recent submissions regardless of status.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Submission>, SubmissionError> {
        self.store
            .find_by_status(None, SortOrder::NewestFirst, limit)
            .await
    }

    /// Approved submissions in publish order (oldest first).
    pub async fn list_approved_fifo(
        &self,
        limit: u32,
    ) -> Result<Vec<Submission>, SubmissionError> {
        self.store
            .find_by_status(Some(SubmissionStatus::Approved), SortOrder::OldestFirst, limit)
            .await
    }

    /// Look a submission up by its textual id. Malformed ids read as absent.
    pub async fn get(&self, id: &str) -> Result<Option<Submission>, SubmissionError> {
        match SubmissionId::parse(id) {
            Some(id) => self.store.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Move a submission to `status`.
    ///
    /// Returns `true` only when the submission existed, held the one status
    /// `status` may follow, and no concurrent writer got there first.
    /// Re-applying the same status therefore returns `false`.
    pub async fn set_status(
        &self,
        id: &str,
        status: SubmissionStatus,
    ) -> Result<bool, SubmissionError> {
        let Some(id) = SubmissionId::parse(id) else {
            return Ok(false);
        };
        self.transition(id, status).await
    }

    /// Typed shortcut for `approved -> published`, used after a delivery.
    pub async fn mark_published(&self, id: SubmissionId) -> Result<bool, SubmissionError> {
        self.transition(id, SubmissionStatus::Published).await
    }

    /// Forward the liveness probe to the store.
    pub async fn ping(&self) -> Result<(), SubmissionError> {
        self.store.ping().await
    }

    async fn transition(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<bool, SubmissionError> {
        let Some(expected) = status.required_predecessor() else {
            return Ok(false);
        };

        let updated = self
            .store
            .compare_and_set_status(id, expected, status)
            .await?;

        if updated {
            tracing::info!(submission_id = %id, from = %expected, to = %status, "Submission status changed");
        } else {
            tracing::debug!(submission_id = %id, to = %status, "Status change did not apply");
        }
        Ok(updated)
    }
}

// ============================================================================
// TESTS
// ============================================================================
