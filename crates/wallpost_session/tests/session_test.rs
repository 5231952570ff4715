//! Tests for credential acquisition, refresh, and keep-alive behavior.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallpost_core::{PublishImages, PublishResponse, SessionConfig};
use wallpost_error::{CredentialErrorKind, PublishError, PublishErrorKind, WallpostErrorKind,
    WallpostResult};
use wallpost_interface::{
    BotSession, DeviceLogin, PublishClient, QrHandle, QrPollState, SessionProvider, SessionRefresh,
};
use wallpost_session::{
    acquire_initial_credential, qr_login, KeepAlive, QrLoginOptions, SessionRefresher,
};

#[derive(Default)]
struct MockSession {
    credential: String,
    messages: Mutex<Vec<(i64, String)>>,
}

impl BotSession for MockSession {
    fn current_credential(&self, _domain: &str) -> String {
        self.credential.clone()
    }

    fn raw_resource_key_report(&self) -> String {
        String::new()
    }

    fn send_message(&self, channel: i64, text: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((channel, text.to_string()));
    }
}

#[derive(Default)]
struct MockProvider {
    sessions: Vec<Arc<MockSession>>,
}

impl MockProvider {
    fn with_credentials(creds: &[&str]) -> Self {
        Self {
            sessions: creds
                .iter()
                .map(|c| {
                    Arc::new(MockSession {
                        credential: c.to_string(),
                        ..MockSession::default()
                    })
                })
                .collect(),
        }
    }

    fn message_count(&self) -> usize {
        self.sessions
            .iter()
            .map(|s| s.messages.lock().unwrap().len())
            .sum()
    }
}

impl SessionProvider for MockProvider {
    fn for_each_session(&self, f: &mut dyn FnMut(&dyn BotSession) -> bool) {
        for session in &self.sessions {
            if !f(session.as_ref()) {
                return;
            }
        }
    }
}

struct MockClient {
    probe_ok: AtomicBool,
    probes: AtomicUsize,
    credentials: Mutex<Vec<String>>,
}

impl MockClient {
    fn new(probe_ok: bool) -> Self {
        Self {
            probe_ok: AtomicBool::new(probe_ok),
            probes: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PublishClient for MockClient {
    async fn publish(
        &self,
        _text: &str,
        _images: &PublishImages,
    ) -> WallpostResult<PublishResponse> {
        Ok(PublishResponse::default())
    }

    async fn update_credential(&self, credential: &str) -> WallpostResult<()> {
        self.credentials.lock().unwrap().push(credential.to_string());
        Ok(())
    }

    async fn probe(&self) -> WallpostResult<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.probe_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PublishError::new(PublishErrorKind::Auth("expired".to_string())).into())
        }
    }

    fn uin(&self) -> i64 {
        0
    }
}

fn assert_credential_kind(err: wallpost_error::WallpostError, expected: CredentialErrorKind) {
    match err.kind() {
        WallpostErrorKind::Credential(c) => assert_eq!(c.kind, expected),
        other => panic!("expected credential error, got {other}"),
    }
}

#[tokio::test]
async fn test_configured_credential_wins() {
    let config = SessionConfig {
        cookie: "uin=o1;skey=@cfg".to_string(),
        ..SessionConfig::default()
    };
    let provider = MockProvider::with_credentials(&["uin=o2;skey=@bot"]);
    let credential = acquire_initial_credential(&config, &provider, None)
        .await
        .unwrap();
    assert_eq!(credential, "uin=o1;skey=@cfg");
}

#[tokio::test]
async fn test_credential_file_read_before_bots() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "uin=o3;skey=@file").unwrap();
    let config = SessionConfig {
        cookie_file: Some(file.path().to_path_buf()),
        ..SessionConfig::default()
    };
    let provider = MockProvider::with_credentials(&["uin=o2;skey=@bot"]);
    let credential = acquire_initial_credential(&config, &provider, None)
        .await
        .unwrap();
    assert_eq!(credential, "uin=o3;skey=@file");
}

#[tokio::test]
async fn test_bot_credential_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookie.txt");
    let config = SessionConfig {
        cookie_file: Some(path.clone()),
        ..SessionConfig::default()
    };
    let provider = MockProvider::with_credentials(&["", "uin=o2;skey=@bot"]);
    let credential = acquire_initial_credential(&config, &provider, None)
        .await
        .unwrap();
    assert_eq!(credential, "uin=o2;skey=@bot");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "uin=o2;skey=@bot"
    );
}

#[tokio::test]
async fn test_acquisition_exhaustion() {
    let config = SessionConfig::default();
    let provider = MockProvider::with_credentials(&["", ""]);
    let err = acquire_initial_credential(&config, &provider, None)
        .await
        .unwrap_err();
    assert_credential_kind(err, CredentialErrorKind::Exhausted);
}

struct ScriptedLogin {
    states: Mutex<Vec<QrPollState>>,
}

impl ScriptedLogin {
    fn new(mut states: Vec<QrPollState>) -> Self {
        states.reverse();
        Self {
            states: Mutex::new(states),
        }
    }
}

#[async_trait]
impl DeviceLogin for ScriptedLogin {
    async fn begin(&self) -> WallpostResult<QrHandle> {
        Ok(QrHandle {
            id: "qr-1".to_string(),
            image: vec![0x89, 0x50, 0x4e, 0x47],
        })
    }

    async fn poll(&self, _handle: &QrHandle) -> WallpostResult<QrPollState> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(QrPollState::Pending))
    }
}

fn fast_qr_options(dir: &std::path::Path, max_attempts: u32) -> QrLoginOptions {
    QrLoginOptions {
        poll_interval: Duration::from_millis(1),
        max_attempts,
        image_path: dir.join("qrcode.png"),
    }
}

#[tokio::test]
async fn test_qr_login_success_removes_image() {
    let dir = tempfile::tempdir().unwrap();
    let opts = fast_qr_options(dir.path(), 10);
    let login = ScriptedLogin::new(vec![
        QrPollState::Pending,
        QrPollState::Scanned,
        QrPollState::Success("uin=o9;skey=@qr".to_string()),
    ]);
    let credential = qr_login(&login, &opts).await.unwrap();
    assert_eq!(credential, "uin=o9;skey=@qr");
    assert!(!opts.image_path.exists());
}

#[tokio::test]
async fn test_qr_login_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let opts = fast_qr_options(dir.path(), 10);
    let login = ScriptedLogin::new(vec![QrPollState::Pending, QrPollState::Expired]);
    let err = qr_login(&login, &opts).await.unwrap_err();
    assert_credential_kind(err, CredentialErrorKind::QrExpired);
}

#[tokio::test]
async fn test_qr_login_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let opts = fast_qr_options(dir.path(), 3);
    let login = ScriptedLogin::new(vec![]);
    let err = qr_login(&login, &opts).await.unwrap_err();
    assert_credential_kind(err, CredentialErrorKind::QrTimeout(3));
}

#[tokio::test]
async fn test_refresher_returns_and_persists_credential() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookie.txt");
    let provider = Arc::new(MockProvider::with_credentials(&["", "uin=o7;skey=@bot"]));
    let refresher = SessionRefresher::new(provider.clone(), Some(path.clone()), 12345);
    let credential = refresher.refresh().await.unwrap();
    assert_eq!(credential, "uin=o7;skey=@bot");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "uin=o7;skey=@bot");
    // No notification on the success path.
    assert_eq!(provider.message_count(), 0);
}

#[tokio::test]
async fn test_refresher_notifies_admin_once_on_failure() {
    let provider = Arc::new(MockProvider::with_credentials(&["", ""]));
    let refresher = SessionRefresher::new(provider.clone(), None, 12345);
    let err = refresher.refresh().await.unwrap_err();
    match err.kind() {
        WallpostErrorKind::Credential(c) => {
            assert!(matches!(c.kind, CredentialErrorKind::RefreshFailed(_)));
        }
        other => panic!("expected credential error, got {other}"),
    }
    assert_eq!(provider.message_count(), 1);
    let (channel, _) = provider.sessions[0].messages.lock().unwrap()[0].clone();
    assert_eq!(channel, 12345);
}

#[tokio::test]
async fn test_refresher_is_safe_under_concurrent_invocation() {
    let provider = Arc::new(MockProvider::with_credentials(&["uin=o8;skey=@bot"]));
    let refresher = Arc::new(SessionRefresher::new(provider, None, 0));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let refresher = Arc::clone(&refresher);
        handles.push(tokio::spawn(async move { refresher.refresh().await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "uin=o8;skey=@bot");
    }
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_refreshes_from_bot_on_probe_failure() {
    let config = SessionConfig {
        keep_alive_secs: 60,
        admin_channel: 999,
        ..SessionConfig::default()
    };
    let client = Arc::new(MockClient::new(false));
    let provider = Arc::new(MockProvider::with_credentials(&["uin=o5;skey=@bot"]));
    let mut keepalive = KeepAlive::new(config, client.clone(), provider.clone());
    keepalive.start();

    tokio::time::sleep(Duration::from_secs(90)).await;
    keepalive.stop().await;

    assert_eq!(client.probes.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.credentials.lock().unwrap().as_slice(),
        ["uin=o5;skey=@bot"]
    );
    // Recovery succeeded; no admin notification.
    assert_eq!(provider.message_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_notifies_once_per_failed_cycle() {
    let config = SessionConfig {
        keep_alive_secs: 60,
        admin_channel: 999,
        ..SessionConfig::default()
    };
    let client = Arc::new(MockClient::new(false));
    let provider = Arc::new(MockProvider::with_credentials(&["", ""]));
    let mut keepalive = KeepAlive::new(config, client.clone(), provider.clone());
    keepalive.start();

    // Two full probe cycles.
    tokio::time::sleep(Duration::from_secs(150)).await;
    keepalive.stop().await;

    assert_eq!(client.probes.load(Ordering::SeqCst), 2);
    assert_eq!(provider.message_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_noop_while_session_valid() {
    let config = SessionConfig {
        keep_alive_secs: 60,
        admin_channel: 999,
        ..SessionConfig::default()
    };
    let client = Arc::new(MockClient::new(true));
    let provider = Arc::new(MockProvider::default());
    let mut keepalive = KeepAlive::new(config, client.clone(), provider.clone());
    keepalive.start();

    tokio::time::sleep(Duration::from_secs(90)).await;
    keepalive.stop().await;

    assert_eq!(client.probes.load(Ordering::SeqCst), 1);
    assert!(client.credentials.lock().unwrap().is_empty());
    assert_eq!(provider.message_count(), 0);
}

#[tokio::test]
async fn test_keepalive_disabled_at_zero_interval() {
    let config = SessionConfig::default();
    let client = Arc::new(MockClient::new(false));
    let provider = Arc::new(MockProvider::default());
    let mut keepalive = KeepAlive::new(config, client.clone(), provider);
    keepalive.start();
    keepalive.stop().await;
    assert_eq!(client.probes.load(Ordering::SeqCst), 0);
}
