//! Publish client error types.

/// Kinds of publish errors.
///
/// The worker pool treats `Api` and `Transport` as transient (retried against
/// the configured budget); `Auth` is surfaced by the publish client only after
/// its session-expired recovery path has already failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PublishErrorKind {
    /// The feed service accepted the call but reported a failure code.
    #[display("publish failed: code={}, msg={}", code, message)]
    Api {
        /// Service-reported failure code
        code: i64,
        /// Service-reported failure message
        message: String,
    },
    /// Network or protocol failure before a response was obtained.
    #[display("transport failure: {}", _0)]
    Transport(String),
    /// Authentication failure that survived credential refresh.
    #[display("authentication failed: {}", _0)]
    Auth(String),
    /// The response body could not be interpreted.
    #[display("malformed response: {}", _0)]
    MalformedResponse(String),
}

/// Publish error with location tracking.
///
/// # Examples
///
/// ```
/// use wallpost_error::{PublishError, PublishErrorKind};
///
/// let err = PublishError::new(PublishErrorKind::Api {
///     code: -3000,
///     message: "operation too frequent".to_string(),
/// });
/// assert!(format!("{}", err).contains("-3000"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Publish Error: {} at line {} in {}", kind, line, file)]
pub struct PublishError {
    /// The kind of error that occurred
    pub kind: PublishErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PublishError {
    /// Create a new publish error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PublishErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
