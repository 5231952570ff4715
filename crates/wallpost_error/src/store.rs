//! Submission store error types.

/// Kinds of submission store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Failed to read from the store
    #[display("Failed to read from store: {}", _0)]
    Read(String),
    /// Failed to persist a submission
    #[display("Failed to persist submission: {}", _0)]
    Write(String),
    /// Submission not found by id
    #[display("Submission not found: {}", _0)]
    NotFound(i64),
    /// Store backend is unavailable
    #[display("Store unavailable: {}", _0)]
    Unavailable(String),
}

/// Submission store error with location tracking.
///
/// # Examples
///
/// ```
/// use wallpost_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound(42));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
