// Submission domain models - the one entity the bot moderates.
//
// These are pure domain types with no Discord or database dependencies.
// The store and the Discord layer convert to and from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Language tag used when the submitter doesn't give one.
pub const DEFAULT_LANG: &str = "en";

/// Longer tags are cut to this many characters.
pub const MAX_LANG_CHARS: usize = 16;

/// Opaque identifier assigned by the store when a submission is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Generate a fresh identifier. Only stores should call this.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user-supplied identifier.
    ///
    /// Returns `None` for anything that isn't a well-formed id; callers treat
    /// that exactly like an unknown id.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Where a submission is in the moderation pipeline.
///
/// Legal transitions: `Pending -> Approved`, `Pending -> Rejected`,
/// `Approved -> Published`. `Rejected` and `Published` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    Published,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Published => "published",
        }
    }

    /// The only status a submission may hold right before moving to `self`.
    /// `None` means nothing can transition into this status.
    pub fn required_predecessor(&self) -> Option<SubmissionStatus> {
        match self {
            SubmissionStatus::Pending => None,
            SubmissionStatus::Approved | SubmissionStatus::Rejected => {
                Some(SubmissionStatus::Pending)
            }
            SubmissionStatus::Published => Some(SubmissionStatus::Approved),
        }
    }

    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        next.required_predecessor() == Some(*self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Rejected | SubmissionStatus::Published)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown submission status `{}`", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "published" => Ok(SubmissionStatus::Published),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Ordering by `created_at`. Always passed explicitly to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first (publish order).
    OldestFirst,
    /// Newest first (review order).
    NewestFirst,
}

/// One anonymously authored text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub text: String,
    pub lang: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

/// Normalise an optional language tag, falling back to [`DEFAULT_LANG`] and
/// keeping at most [`MAX_LANG_CHARS`] characters.
pub fn normalize_lang(lang: Option<&str>) -> String {
    match lang.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag
            .chars()
            .take(MAX_LANG_CHARS)
            .collect::<String>()
            .to_ascii_lowercase(),
        _ => DEFAULT_LANG.to_string(),
    }
}
