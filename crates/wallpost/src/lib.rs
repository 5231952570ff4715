//! Moderated submission publishing pipeline.
//!
//! Facade crate re-exporting the pipeline's building blocks and providing
//! the application settings and logging setup used by the `wallpost` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;
mod settings;

pub use observability::init_observability;
pub use settings::{LogSettings, Settings};

pub use wallpost_client::{parse_uin, HttpPublishClient};
pub use wallpost_core::{
    PublishImages, PublishResponse, SessionConfig, Submission, SubmissionStatus, WallConfig,
    WorkerConfig,
};
pub use wallpost_error::{WallpostError, WallpostErrorKind, WallpostResult};
pub use wallpost_interface::{
    BotSession, DeviceLogin, EmptySessionProvider, MemoryStore, NoopRenderer, PublishClient,
    QrHandle, QrPollState, Renderer, SessionProvider, SessionRefresh, SubmissionStore,
};
pub use wallpost_rkey::ResourceKeyCache;
pub use wallpost_session::{
    acquire_initial_credential, KeepAlive, QrLoginOptions, SessionRefresher,
};
pub use wallpost_worker::{PublishPermit, PublishSpacer, WorkerPool};
