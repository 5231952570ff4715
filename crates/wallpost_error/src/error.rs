//! Top-level error wrapper types.

use crate::{ConfigError, CredentialError, HttpError, PublishError, RenderError, StoreError};

/// This is the foundation error enum for the wallpost workspace. Each core
/// crate contributes its own variant through the `From` derives below.
///
/// # Examples
///
/// ```
/// use wallpost_error::{WallpostError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: WallpostError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum WallpostErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Submission store error
    #[from(StoreError)]
    Store(StoreError),
    /// Publish client error
    #[from(PublishError)]
    Publish(PublishError),
    /// Credential lifecycle error
    #[from(CredentialError)]
    Credential(CredentialError),
    /// Renderer error
    #[from(RenderError)]
    Render(RenderError),
}

/// Wallpost error with kind discrimination.
///
/// # Examples
///
/// ```
/// use wallpost_error::{WallpostResult, ConfigError};
///
/// fn might_fail() -> WallpostResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Wallpost Error: {}", _0)]
pub struct WallpostError(Box<WallpostErrorKind>);

impl WallpostError {
    /// Create a new error from a kind.
    pub fn new(kind: WallpostErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WallpostErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to WallpostErrorKind
impl<T> From<T> for WallpostError
where
    T: Into<WallpostErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for wallpost operations.
///
/// # Examples
///
/// ```
/// use wallpost_error::{WallpostResult, HttpError};
///
/// fn fetch_data() -> WallpostResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type WallpostResult<T> = std::result::Result<T, WallpostError>;
