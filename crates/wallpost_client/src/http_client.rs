//! Feed-service client over reqwest.

use async_trait::async_trait;
use base64::Engine;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use wallpost_core::{PublishImages, PublishResponse};
use wallpost_error::{HttpError, PublishError, PublishErrorKind, WallpostResult};
use wallpost_interface::{PublishClient, SessionRefresh};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CredentialState {
    cookie: String,
    uin: i64,
}

/// Derive the numeric account identifier from a browser-style cookie string.
///
/// The account id travels as `uin=o<digits>` (the `o` prefix pads the value);
/// returns zero when the field is absent or malformed.
///
/// # Examples
///
/// ```
/// use wallpost_client::parse_uin;
///
/// assert_eq!(parse_uin("uin=o0123456789; skey=@abc"), 123456789);
/// assert_eq!(parse_uin("skey=@abc"), 0);
/// ```
pub fn parse_uin(cookie: &str) -> i64 {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("uin="))
        .map(|v| v.trim_start_matches('o'))
        .and_then(|v| v.trim_start_matches('0').parse::<i64>().ok())
        .unwrap_or(0)
}

/// HTTP-backed [`PublishClient`].
///
/// The credential lives behind an interior `RwLock`, so
/// [`update_credential`] is safe to call while publishes are in flight.
/// Authenticated calls that come back `401`/`403` trigger the
/// session-expired refresher once and replay the request with the new
/// credential; a second authentication failure surfaces as
/// [`PublishErrorKind::Auth`].
///
/// [`update_credential`]: PublishClient::update_credential
pub struct HttpPublishClient {
    http: reqwest::Client,
    base_url: String,
    state: RwLock<CredentialState>,
    refresher: Option<Arc<dyn SessionRefresh>>,
}

impl HttpPublishClient {
    /// Create a client with an initial credential and an optional
    /// session-expired refresher.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    #[instrument(skip(base_url, credential, refresher), fields(credential_len = credential.len()))]
    pub fn new(
        base_url: impl Into<String>,
        credential: &str,
        refresher: Option<Arc<dyn SessionRefresh>>,
    ) -> WallpostResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::new(format!("failed to build http client: {e}")))?;
        let uin = parse_uin(credential);
        info!(uin, "publish client created");
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: RwLock::new(CredentialState {
                cookie: credential.to_string(),
                uin,
            }),
            refresher,
        })
    }

    fn cookie(&self) -> String {
        self.read_state().cookie
    }

    fn read_state(&self) -> CredentialState {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn publish_body(text: &str, images: &PublishImages) -> serde_json::Value {
        let b64 = base64::engine::general_purpose::STANDARD;
        let mut body = serde_json::json!({ "text": text });
        if !images.bytes.is_empty() {
            body["images_b64"] = images
                .bytes
                .iter()
                .map(|b| serde_json::Value::String(b64.encode(b)))
                .collect();
        }
        if !images.urls.is_empty() {
            body["image_urls"] = serde_json::json!(images.urls);
        }
        body
    }

    async fn publish_once(
        &self,
        text: &str,
        images: &PublishImages,
    ) -> Result<PublishResponse, AttemptError> {
        let response = self
            .http
            .post(format!("{}/publish", self.base_url))
            .header(reqwest::header::COOKIE, self.cookie())
            .json(&Self::publish_body(text, images))
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AttemptError::Auth(format!("http status {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Transport(format!("http status {status}")));
        }
        response
            .json::<PublishResponse>()
            .await
            .map_err(|e| AttemptError::Malformed(e.to_string()))
    }

    async fn probe_once(&self) -> Result<(), AttemptError> {
        let response = self
            .http
            .get(format!("{}/feeds", self.base_url))
            .query(&[("num", "1")])
            .header(reqwest::header::COOKIE, self.cookie())
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AttemptError::Auth(format!("http status {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Transport(format!("http status {status}")));
        }
        Ok(())
    }

    /// Run the session-expired refresher and install the new credential.
    async fn recover_credential(&self, cause: &str) -> WallpostResult<()> {
        let Some(refresher) = &self.refresher else {
            return Err(PublishError::new(PublishErrorKind::Auth(cause.to_string())).into());
        };
        warn!(cause, "session expired, invoking refresher");
        let fresh = refresher.refresh().await?;
        self.update_credential(&fresh).await
    }
}

enum AttemptError {
    Transport(String),
    Auth(String),
    Malformed(String),
}

impl AttemptError {
    fn into_publish_error(self) -> PublishError {
        match self {
            Self::Transport(msg) => PublishError::new(PublishErrorKind::Transport(msg)),
            Self::Auth(msg) => PublishError::new(PublishErrorKind::Auth(msg)),
            Self::Malformed(msg) => PublishError::new(PublishErrorKind::MalformedResponse(msg)),
        }
    }
}

#[async_trait]
impl PublishClient for HttpPublishClient {
    #[instrument(skip(self, text, images), fields(text_len = text.len()))]
    async fn publish(
        &self,
        text: &str,
        images: &PublishImages,
    ) -> WallpostResult<PublishResponse> {
        match self.publish_once(text, images).await {
            Ok(resp) => Ok(resp),
            Err(AttemptError::Auth(cause)) => {
                self.recover_credential(&cause).await?;
                debug!("replaying publish after credential refresh");
                self.publish_once(text, images)
                    .await
                    .map_err(|e| e.into_publish_error().into())
            }
            Err(e) => Err(e.into_publish_error().into()),
        }
    }

    async fn update_credential(&self, credential: &str) -> WallpostResult<()> {
        if credential.trim().is_empty() {
            Err(PublishError::new(PublishErrorKind::Auth(
                "empty credential".to_string(),
            )))?;
        }
        let uin = parse_uin(credential);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.cookie = credential.to_string();
        state.uin = uin;
        info!(uin, "credential updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn probe(&self) -> WallpostResult<()> {
        self.probe_once()
            .await
            .map_err(|e| e.into_publish_error().into())
    }

    fn uin(&self) -> i64 {
        self.read_state().uin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uin_strips_padding() {
        assert_eq!(parse_uin("uin=o0000012345;skey=@x"), 12345);
        assert_eq!(parse_uin("p_skey=a; uin=o987654321"), 987654321);
    }

    #[test]
    fn test_parse_uin_handles_missing_or_garbage() {
        assert_eq!(parse_uin(""), 0);
        assert_eq!(parse_uin("uin=onotanumber"), 0);
        assert_eq!(parse_uin("skey=@x"), 0);
    }

    #[test]
    fn test_publish_body_shapes() {
        let images = PublishImages {
            bytes: vec![vec![1, 2, 3]],
            urls: vec!["https://img/1.png".to_string()],
        };
        let body = HttpPublishClient::publish_body("hello", &images);
        assert_eq!(body["text"], "hello");
        assert_eq!(body["images_b64"][0], "AQID");
        assert_eq!(body["image_urls"][0], "https://img/1.png");

        let body = HttpPublishClient::publish_body("hello", &PublishImages::default());
        assert!(body.get("images_b64").is_none());
        assert!(body.get("image_urls").is_none());
    }

    #[tokio::test]
    async fn test_update_credential_rejects_empty() {
        let client = HttpPublishClient::new("http://localhost:1", "uin=o1;", None).unwrap();
        assert!(client.update_credential("  ").await.is_err());
        assert_eq!(client.uin(), 1);
    }

    #[tokio::test]
    async fn test_update_credential_swaps_uin() {
        let client = HttpPublishClient::new("http://localhost:1", "uin=o1;", None).unwrap();
        client.update_credential("uin=o42;skey=@y").await.unwrap();
        assert_eq!(client.uin(), 42);
    }
}
