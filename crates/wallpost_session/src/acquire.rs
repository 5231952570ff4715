//! Startup credential acquisition.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use wallpost_core::SessionConfig;
use wallpost_error::{CredentialError, CredentialErrorKind, WallpostResult};
use wallpost_interface::{DeviceLogin, QrPollState, SessionProvider};

/// Cookie domain the bot sessions are asked for.
pub const FEED_COOKIE_DOMAIN: &str = "qzone.qq.com";

/// Options for the device-pairing login polling loop.
#[derive(Debug, Clone)]
pub struct QrLoginOptions {
    /// Delay between poll attempts
    pub poll_interval: Duration,
    /// Poll attempt budget before giving up
    pub max_attempts: u32,
    /// Where the QR image is written for the operator to scan
    pub image_path: PathBuf,
}

impl Default for QrLoginOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 120,
            image_path: PathBuf::from("qrcode.png"),
        }
    }
}

/// Persist a credential to the configured file, overwriting any prior value.
///
/// Write failures are logged and swallowed: a missing credential file only
/// costs a re-acquisition on the next start.
pub fn persist_credential(path: Option<&Path>, credential: &str) {
    let Some(path) = path else { return };
    match std::fs::write(path, credential) {
        Ok(()) => info!(path = %path.display(), "credential persisted"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to persist credential"),
    }
}

/// Scan connected bot sessions for a credential; first non-empty value wins.
pub fn credential_from_sessions(sessions: &dyn SessionProvider, domain: &str) -> Option<String> {
    let mut found = None;
    sessions.for_each_session(&mut |session| {
        let credential = session.current_credential(domain);
        if credential.is_empty() {
            true
        } else {
            found = Some(credential);
            false
        }
    });
    found
}

/// Try every startup credential source in priority order.
///
/// Order: explicitly configured value, previously persisted file, connected
/// bot sessions, then (when enabled and a flow is wired) device-pairing QR
/// login. The first success is persisted to the credential file and returned.
///
/// # Errors
///
/// Returns [`CredentialErrorKind::Exhausted`] when every source came up
/// empty, or the QR flow's own error when it was reached and failed.
pub async fn acquire_initial_credential(
    config: &SessionConfig,
    sessions: &dyn SessionProvider,
    login: Option<&dyn DeviceLogin>,
) -> WallpostResult<String> {
    let cookie_file = config.cookie_file.as_deref();

    if !config.cookie.is_empty() {
        info!("using explicitly configured credential");
        persist_credential(cookie_file, &config.cookie);
        return Ok(config.cookie.clone());
    }

    if let Some(path) = cookie_file {
        match std::fs::read_to_string(path) {
            Ok(data) if !data.trim().is_empty() => {
                info!(path = %path.display(), "loaded credential from file");
                return Ok(data);
            }
            Ok(_) => debug!(path = %path.display(), "credential file empty"),
            Err(e) => debug!(path = %path.display(), error = %e, "credential file unreadable"),
        }
    }

    if let Some(credential) = credential_from_sessions(sessions, FEED_COOKIE_DOMAIN) {
        info!("obtained credential from connected bot session");
        persist_credential(cookie_file, &credential);
        return Ok(credential);
    }

    if config.auto_login {
        if let Some(login) = login {
            let credential = qr_login(login, &QrLoginOptions::default()).await?;
            persist_credential(cookie_file, &credential);
            return Ok(credential);
        }
    }

    Err(CredentialError::new(CredentialErrorKind::Exhausted).into())
}

/// Run a device-pairing login to completion.
///
/// Writes the QR image to `opts.image_path`, polls at `opts.poll_interval`
/// up to `opts.max_attempts` times, and removes the image on success.
///
/// # Errors
///
/// Returns [`CredentialErrorKind::QrExpired`] on explicit expiry and
/// [`CredentialErrorKind::QrTimeout`] when the attempt budget runs out.
pub async fn qr_login(login: &dyn DeviceLogin, opts: &QrLoginOptions) -> WallpostResult<String> {
    let handle = login.begin().await?;

    match std::fs::write(&opts.image_path, &handle.image) {
        Ok(()) => info!(path = %opts.image_path.display(), "QR code written, scan to log in"),
        Err(e) => warn!(path = %opts.image_path.display(), error = %e, "failed to write QR image"),
    }

    for attempt in 0..opts.max_attempts {
        tokio::time::sleep(opts.poll_interval).await;
        match login.poll(&handle).await? {
            QrPollState::Success(credential) => {
                info!(attempt, "QR login confirmed");
                let _ = std::fs::remove_file(&opts.image_path);
                return Ok(credential);
            }
            QrPollState::Expired => {
                return Err(CredentialError::new(CredentialErrorKind::QrExpired).into());
            }
            QrPollState::Scanned => debug!(attempt, "QR scanned, awaiting confirmation"),
            QrPollState::Pending => {}
        }
    }
    Err(CredentialError::new(CredentialErrorKind::QrTimeout(opts.max_attempts)).into())
}
