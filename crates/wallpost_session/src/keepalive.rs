//! Keep-alive probe task.

use crate::acquire::{credential_from_sessions, persist_credential, FEED_COOKIE_DOMAIN};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wallpost_core::SessionConfig;
use wallpost_interface::{PublishClient, SessionProvider};

/// Periodically probes session validity and refreshes the credential.
///
/// On each tick the prober issues one cheap read-only call. When it fails the
/// prober queries every connected bot session for a credential; if none is
/// available it sends exactly one notification to the administrative channel
/// and waits for the next cycle.
pub struct KeepAlive {
    config: SessionConfig,
    client: Arc<dyn PublishClient>,
    sessions: Arc<dyn SessionProvider>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    /// Create a keep-alive prober; call [`start`] to launch it.
    ///
    /// [`start`]: KeepAlive::start
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn PublishClient>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            client,
            sessions,
            shutdown,
            handle: None,
        }
    }

    /// Launch the probe task. A configured interval of zero disables the
    /// mechanism entirely.
    pub fn start(&mut self) {
        let Some(interval) = self.config.keep_alive() else {
            info!("keep-alive disabled (interval is zero)");
            return;
        };
        let client = Arc::clone(&self.client);
        let sessions = Arc::clone(&self.sessions);
        let config = self.config.clone();
        let mut shutdown = self.shutdown.subscribe();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval is immediate; skip it so the
            // first probe happens one full interval after startup.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("keep-alive stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        run_probe_cycle(&config, &*client, &*sessions).await;
                    }
                }
            }
        }));
        info!(interval_secs = self.config.keep_alive_secs, "keep-alive started");
    }

    /// Signal the probe task to stop and wait for it to finish.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// One probe cycle: probe, and on failure refresh or notify.
async fn run_probe_cycle(
    config: &SessionConfig,
    client: &dyn PublishClient,
    sessions: &dyn SessionProvider,
) {
    debug!("probing session validity");
    match client.probe().await {
        Ok(()) => {
            debug!("session still valid");
            return;
        }
        Err(e) => warn!(error = %e, "session probe failed"),
    }

    if let Some(credential) = credential_from_sessions(sessions, FEED_COOKIE_DOMAIN) {
        match client.update_credential(&credential).await {
            Ok(()) => {
                info!(uin = client.uin(), "credential refreshed from bot session");
                persist_credential(config.cookie_file.as_deref(), &credential);
                return;
            }
            Err(e) => warn!(error = %e, "refreshed credential rejected by client"),
        }
    }

    notify_admin(
        config,
        sessions,
        "⚠️ 会话已过期，请重新扫码登录",
    );
}

// One message per failed probe cycle, via the first connected session.
fn notify_admin(config: &SessionConfig, sessions: &dyn SessionProvider, text: &str) {
    if config.admin_channel <= 0 {
        return;
    }
    sessions.for_each_session(&mut |session| {
        session.send_message(config.admin_channel, text);
        false
    });
}
