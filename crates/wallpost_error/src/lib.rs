//! Error types for the wallpost publication pipeline.
//!
//! This crate provides the foundation error types used throughout the wallpost
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use wallpost_error::{WallpostResult, HttpError};
//!
//! fn fetch_data() -> WallpostResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credential;
mod error;
mod http;
mod publish;
mod render;
mod store;

pub use config::ConfigError;
pub use credential::{CredentialError, CredentialErrorKind};
pub use error::{WallpostError, WallpostErrorKind, WallpostResult};
pub use http::HttpError;
pub use publish::{PublishError, PublishErrorKind};
pub use render::RenderError;
pub use store::{StoreError, StoreErrorKind};
