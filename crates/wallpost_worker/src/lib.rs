//! Publication worker pool.
//!
//! N concurrent pollers claim approved submissions from the store, render
//! them when a renderer is available, and publish them to the feed service
//! under a global rate limit and a bounded per-item retry budget.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod spacer;
mod worker;

pub use spacer::{PublishPermit, PublishSpacer};
pub use worker::WorkerPool;
