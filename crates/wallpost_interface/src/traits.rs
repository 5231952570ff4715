//! Trait definitions for the pipeline's external collaborators.

use async_trait::async_trait;
use wallpost_core::{PublishImages, PublishResponse, Submission, SubmissionStatus};
use wallpost_error::{RenderError, WallpostResult};

/// Persistent store of submissions.
///
/// The store is shared by every worker and must be safe for concurrent access.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Atomically claim the oldest approved, unpublished submission.
    ///
    /// Claiming must be race-free: no two concurrent callers may receive the
    /// same submission. A claim is released when a subsequent [`save`] writes
    /// a status for the submission; saving a non-terminal status returns the
    /// item to the claimable pool.
    ///
    /// [`save`]: SubmissionStore::save
    async fn claim_approved(&self) -> WallpostResult<Option<Submission>>;

    /// Persist a submission, releasing any claim held on it.
    async fn save(&self, submission: &Submission) -> WallpostResult<()>;

    /// Fetch a submission by id.
    async fn get(&self, id: i64) -> WallpostResult<Option<Submission>>;

    /// List submissions with the given status, oldest first.
    async fn list_by_status(&self, status: SubmissionStatus) -> WallpostResult<Vec<Submission>>;

    /// Count submissions with the given status.
    async fn count_by_status(&self, status: SubmissionStatus) -> WallpostResult<usize>;
}

/// Image renderer for submissions.
///
/// Unavailability is an expected state, not an error: publishing degrades to
/// text plus raw image references.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Whether the renderer can currently produce images.
    fn available(&self) -> bool;

    /// Render a submission into image bytes.
    async fn render(&self, submission: &Submission) -> WallpostResult<Vec<u8>>;
}

/// Permanently unavailable [`Renderer`], for deployments without a rendering
/// backend wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    fn available(&self) -> bool {
        false
    }

    async fn render(&self, _submission: &Submission) -> WallpostResult<Vec<u8>> {
        Err(RenderError::new("no renderer configured").into())
    }
}

/// Outbound client for the feed service.
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Publish text with optional images to the feed.
    async fn publish(&self, text: &str, images: &PublishImages)
        -> WallpostResult<PublishResponse>;

    /// Replace the session credential.
    ///
    /// Must be safe to call concurrently with in-flight publish calls.
    async fn update_credential(&self, credential: &str) -> WallpostResult<()>;

    /// Cheap read-only call used by the keep-alive prober.
    async fn probe(&self) -> WallpostResult<()>;

    /// Numeric account identifier derived from the current credential.
    fn uin(&self) -> i64;
}

/// Supplier of a replacement credential when an authenticated call fails.
///
/// Invoked by the publish client from whatever task detected the failure;
/// implementations must tolerate concurrent invocation.
#[async_trait]
pub trait SessionRefresh: Send + Sync {
    /// Obtain a fresh credential value.
    async fn refresh(&self) -> WallpostResult<String>;
}

/// Handle for an in-progress device-pairing login.
#[derive(Debug, Clone)]
pub struct QrHandle {
    /// Pairing identifier understood by [`DeviceLogin::poll`]
    pub id: String,
    /// QR code image bytes for the operator to scan
    pub image: Vec<u8>,
}

/// Poll outcome of a device-pairing login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPollState {
    /// Not yet scanned
    Pending,
    /// Scanned, awaiting confirmation on the device
    Scanned,
    /// Confirmed; carries the resulting credential
    Success(String),
    /// The QR code expired before confirmation
    Expired,
}

/// Interactive device-pairing login against the feed service.
#[async_trait]
pub trait DeviceLogin: Send + Sync {
    /// Start a pairing attempt and return its QR handle.
    async fn begin(&self) -> WallpostResult<QrHandle>;

    /// Poll a pairing attempt for its current state.
    async fn poll(&self, handle: &QrHandle) -> WallpostResult<QrPollState>;
}
