//! HTTP publish-client adapter.
//!
//! Wraps the outbound feed API behind the [`PublishClient`] trait: holds the
//! session credential, attaches it to every call, and drives the
//! session-expired recovery callback when an authenticated call fails.
//!
//! [`PublishClient`]: wallpost_interface::PublishClient

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod http_client;

pub use http_client::{parse_uin, HttpPublishClient};
