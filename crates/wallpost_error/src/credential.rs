//! Credential lifecycle error types.

/// Kinds of credential acquisition and refresh errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CredentialErrorKind {
    /// Every startup acquisition source was tried and none produced a value.
    #[display("no credential available from any source")]
    Exhausted,
    /// Bot-session refresh produced no usable credential.
    #[display("credential refresh failed: {}", _0)]
    RefreshFailed(String),
    /// The device-pairing QR code expired before being confirmed.
    #[display("login QR code expired")]
    QrExpired,
    /// Device-pairing polling gave up after the configured attempt budget.
    #[display("login timed out after {} attempts", _0)]
    QrTimeout(u32),
    /// Device-pairing flow failed to start or poll.
    #[display("login flow failed: {}", _0)]
    QrFailed(String),
    /// The credential value itself was rejected by the client.
    #[display("credential rejected: {}", _0)]
    Rejected(String),
}

/// Credential error with location tracking.
///
/// # Examples
///
/// ```
/// use wallpost_error::{CredentialError, CredentialErrorKind};
///
/// let err = CredentialError::new(CredentialErrorKind::Exhausted);
/// assert!(format!("{}", err).contains("no credential"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Credential Error: {} at line {} in {}", kind, line, file)]
pub struct CredentialError {
    /// The kind of error that occurred
    pub kind: CredentialErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CredentialError {
    /// Create a new credential error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CredentialErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
