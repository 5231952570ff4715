//! Submission model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a submission.
///
/// `Pending → Approved → Published`, with `Approved → Failed` once the retry
/// budget is exhausted and `Pending → Rejected` decided by moderation.
/// `Failed` and `Rejected` are terminal for the pipeline; only an operator
/// action moves an item back into a claimable state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting moderation
    Pending,
    /// Approved for publication, not yet published
    Approved,
    /// Published to the feed service
    Published,
    /// Rejected by moderation
    Rejected,
    /// Publication failed after exhausting retries
    Failed,
}

/// A moderated text/image submission.
///
/// Invariant: `tid` is non-empty if and only if `status` is
/// [`SubmissionStatus::Published`].
///
/// # Examples
///
/// ```
/// use wallpost_core::{Submission, SubmissionStatus};
///
/// let sub = Submission::new(1, "alice", "hello wall");
/// assert_eq!(sub.status, SubmissionStatus::Pending);
/// assert!(sub.tid.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Store-assigned monotonic identifier
    pub id: i64,
    /// Author display name
    pub author: String,
    /// Free-form submission text
    pub text: String,
    /// Image references in display order (URLs or local paths)
    pub images: Vec<String>,
    /// Whether the author asked to stay anonymous
    pub anonymous: bool,
    /// Current lifecycle status
    pub status: SubmissionStatus,
    /// Failure reason, present only for `Failed`/`Rejected`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// External post identifier, empty until published
    #[serde(default)]
    pub tid: String,
}

impl Submission {
    /// Create a pending submission with no images.
    pub fn new(id: i64, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            text: text.into(),
            images: Vec::new(),
            anonymous: false,
            status: SubmissionStatus::Pending,
            reason: None,
            created_at: Utc::now(),
            tid: String::new(),
        }
    }

    /// Display name for attribution: the author name, or a placeholder when
    /// the author name is empty.
    pub fn display_name(&self) -> &str {
        if self.author.trim().is_empty() {
            "匿名"
        } else {
            &self.author
        }
    }
}
