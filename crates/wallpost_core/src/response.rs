//! Publish request/response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Image payload attached to a publish call.
///
/// Rendered image bytes and raw image references are carried side by side;
/// either (or both) may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishImages {
    /// Rendered image bytes, first image leads the post
    pub bytes: Vec<Vec<u8>>,
    /// Raw image references in display order
    pub urls: Vec<String>,
}

impl PublishImages {
    /// Whether there is nothing to attach.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.urls.is_empty()
    }
}

/// Response from the feed service for a publish call.
///
/// # Examples
///
/// ```
/// use wallpost_core::PublishResponse;
/// use serde_json::json;
///
/// let resp: PublishResponse = serde_json::from_value(json!({
///     "ok": true,
///     "code": 0,
///     "message": "ok",
///     "tid": "9001",
/// })).unwrap();
/// assert!(resp.ok);
/// assert_eq!(resp.field_str("tid"), Some("9001"));
/// assert_eq!(resp.field_str("t1_tid"), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Whether the service reported success
    #[serde(default)]
    pub ok: bool,
    /// Service result code, zero on success
    #[serde(default)]
    pub code: i64,
    /// Service result message
    #[serde(default)]
    pub message: String,
    /// Remaining response fields, preserved verbatim
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl PublishResponse {
    /// Look up a non-empty string-valued extra field by name.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            JsonValue::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}
