// In-memory SubmissionStore for tests.
//
// Mirrors the SQLite store's ordering rules (created_at, then insertion
// order) and can simulate an outage for read/write paths separately.

use super::submission_models::{SortOrder, Submission, SubmissionId, SubmissionStatus};
use super::submission_service::{SubmissionError, SubmissionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub struct InMemorySubmissionStore {
    /// id -> (insertion sequence, submission)
    data: DashMap<SubmissionId, (u64, Submission)>,
    next_seq: AtomicU64,
    unavailable: AtomicBool,
    fail_status_writes: AtomicBool,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_seq: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
            fail_status_writes: AtomicBool::new(false),
        }
    }

    /// Insert a submission with an explicit status and creation time.
    pub fn seed(
        &self,
        text: &str,
        status: SubmissionStatus,
        created_at: DateTime<Utc>,
    ) -> SubmissionId {
        let id = SubmissionId::new();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.data.insert(
            id,
            (
                seq,
                Submission {
                    id,
                    text: text.to_string(),
                    lang: "en".to_string(),
                    status,
                    created_at,
                },
            ),
        );
        id
    }

    pub fn status_of(&self, id: SubmissionId) -> Option<SubmissionStatus> {
        self.data.get(&id).map(|entry| entry.1.status)
    }

    /// Every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Only `compare_and_set_status` fails while set.
    pub fn set_fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), SubmissionError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(SubmissionError::StorageError("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemorySubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert(&self, text: &str, lang: &str) -> Result<SubmissionId, SubmissionError> {
        self.check_available()?;
        let id = self.seed(text, SubmissionStatus::Pending, Utc::now());
        if let Some(mut entry) = self.data.get_mut(&id) {
            entry.1.lang = lang.to_string();
        }
        Ok(id)
    }

    async fn find_by_status(
        &self,
        status: Option<SubmissionStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Submission>, SubmissionError> {
        self.check_available()?;
        let mut rows: Vec<(u64, Submission)> = self
            .data
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.1.status == s))
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            a.created_at.cmp(&b.created_at).then(seq_a.cmp(seq_b))
        });
        if order == SortOrder::NewestFirst {
            rows.reverse();
        }

        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|(_, submission)| submission)
            .collect())
    }

    async fn find_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, SubmissionError> {
        self.check_available()?;
        Ok(self.data.get(&id).map(|entry| entry.1.clone()))
    }

    async fn compare_and_set_status(
        &self,
        id: SubmissionId,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<bool, SubmissionError> {
        self.check_available()?;
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(SubmissionError::StorageError("write rejected".to_string()));
        }

        // get_mut holds the shard lock, so check-and-set is atomic.
        match self.data.get_mut(&id) {
            Some(mut entry) if entry.1.status == expected => {
                entry.1.status = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), SubmissionError> {
        self.check_available()
    }
}

/// Lets a test keep a handle on the store after handing it to a service.
#[async_trait]
impl SubmissionStore for Arc<InMemorySubmissionStore> {
    async fn insert(&self, text: &str, lang: &str) -> Result<SubmissionId, SubmissionError> {
        self.as_ref().insert(text, lang).await
    }

    async fn find_by_status(
        &self,
        status: Option<SubmissionStatus>,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Submission>, SubmissionError> {
        self.as_ref().find_by_status(status, order, limit).await
    }

    async fn find_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, SubmissionError> {
        self.as_ref().find_by_id(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: SubmissionId,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<bool, SubmissionError> {
        self.as_ref()
            .compare_and_set_status(id, expected, new)
            .await
    }

    async fn ping(&self) -> Result<(), SubmissionError> {
        self.as_ref().ping().await
    }
}
