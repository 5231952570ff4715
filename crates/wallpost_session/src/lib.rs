//! Credential lifecycle management.
//!
//! Keeps the publish client authenticated without operator intervention when
//! possible, and escalates to a human when not. Three independent mechanisms:
//!
//! - startup acquisition: config value → credential file → bot sessions →
//!   device-pairing (QR) login, first success wins and is persisted;
//! - a keep-alive prober on its own timer, recovering through bot sessions or
//!   notifying the administrative channel;
//! - a session-expired refresher handed to the publish client, safe to invoke
//!   from any number of in-flight requests at once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod acquire;
mod keepalive;
mod refresher;

pub use acquire::{
    acquire_initial_credential, credential_from_sessions, persist_credential, qr_login,
    QrLoginOptions, FEED_COOKIE_DOMAIN,
};
pub use keepalive::KeepAlive;
pub use refresher::SessionRefresher;
