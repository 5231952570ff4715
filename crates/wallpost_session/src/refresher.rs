//! Session-expired recovery callback.

use crate::acquire::{credential_from_sessions, persist_credential, FEED_COOKIE_DOMAIN};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use wallpost_error::{CredentialError, CredentialErrorKind, WallpostResult};
use wallpost_interface::{SessionProvider, SessionRefresh};

/// Recovers a credential by scanning connected bot sessions.
///
/// Handed to the publish client at construction and invoked whenever an
/// authenticated call fails. Holds no mutable state, so concurrent
/// invocations from multiple in-flight requests are safe; each performs its
/// own scan.
pub struct SessionRefresher {
    sessions: Arc<dyn SessionProvider>,
    cookie_file: Option<PathBuf>,
    admin_channel: i64,
}

impl SessionRefresher {
    /// Create a refresher over the given session provider.
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        cookie_file: Option<PathBuf>,
        admin_channel: i64,
    ) -> Self {
        Self {
            sessions,
            cookie_file,
            admin_channel,
        }
    }

    /// Send one notification to the administrative channel via the first
    /// connected session.
    pub fn notify_admin(&self, text: &str) {
        if self.admin_channel <= 0 {
            return;
        }
        self.sessions.for_each_session(&mut |session| {
            session.send_message(self.admin_channel, text);
            false
        });
    }
}

#[async_trait]
impl SessionRefresh for SessionRefresher {
    async fn refresh(&self) -> WallpostResult<String> {
        info!("session expired, attempting credential refresh from bot sessions");
        if let Some(credential) = credential_from_sessions(&*self.sessions, FEED_COOKIE_DOMAIN) {
            info!("credential refreshed from bot session");
            persist_credential(self.cookie_file.as_deref(), &credential);
            return Ok(credential);
        }
        warn!("no bot session could supply a credential");
        self.notify_admin("⚠️ 会话已过期，自动刷新失败，请重新扫码登录");
        Err(CredentialError::new(CredentialErrorKind::RefreshFailed(
            "no connected session reported a credential".to_string(),
        ))
        .into())
    }
}
