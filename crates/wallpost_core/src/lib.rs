//! Core data types for the wallpost publication pipeline.
//!
//! This crate provides the submission model, publish response types, and the
//! validated configuration surface consumed by the core components.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod response;
mod submission;

pub use config::{SessionConfig, WallConfig, WorkerConfig};
pub use response::{PublishImages, PublishResponse};
pub use submission::{Submission, SubmissionStatus};
