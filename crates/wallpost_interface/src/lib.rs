//! Capability traits at the seams of the wallpost pipeline.
//!
//! The worker pool, credential lifecycle manager, and resource-key cache are
//! written against these traits; the chat-bot transport, persistent store, and
//! renderer plug in behind them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod session;
mod traits;

pub use memory::MemoryStore;
pub use session::{BotSession, EmptySessionProvider, SessionProvider};
pub use traits::{
    DeviceLogin, NoopRenderer, PublishClient, QrHandle, QrPollState, Renderer, SessionRefresh,
    SubmissionStore,
};
