//! Ephemeral resource-key cache.
//!
//! The upstream chat-bot transport reports short-lived signed tokens
//! ("resource keys") in several inconsistent shapes. This crate keeps the
//! freshest value per token class behind a reader/writer lock and answers
//! "best candidate key(s) for this URL" queries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod parse;

pub use cache::ResourceKeyCache;
pub use parse::{mask_key, CLASS_LARGE, CLASS_MEDIA, CLASS_UNCLASSIFIED};
