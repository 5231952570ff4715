//! Tolerant extraction of resource keys from upstream payloads.
//!
//! Parsing is an ordered list of pure attempts; the first attempt yielding at
//! least one entry wins. Upstream adapters have been observed returning a flat
//! JSON array, the same array wrapped under `data`, arbitrary JSON carrying
//! `rkey`/`key` string fields, a bare token, or a query string.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use url::Url;

/// Token class for short-lived media keys.
pub const CLASS_MEDIA: u32 = 10;
/// Token class for large-file/offline keys.
pub const CLASS_LARGE: u32 = 20;
/// Class for keys reported without a recognizable type marker.
pub const CLASS_UNCLASSIFIED: u32 = 0;

const MIN_TOKEN_LEN: usize = 8;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid token regex"))
}

fn field_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)"(?:rkey|key)"\s*:\s*"([^"]+)""#).expect("valid field regex")
    })
}

fn rkey_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[&?])rkey=([A-Za-z0-9_\-]{8,})").expect("valid param regex")
    })
}

/// One extracted (class, key) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) class: u32,
    pub(crate) key: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    r#type: Option<JsonValue>,
    #[serde(default)]
    rkey: String,
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize)]
struct Wrapped {
    #[serde(default)]
    data: Vec<RawEntry>,
}

impl RawEntry {
    fn into_entry(self) -> Option<Entry> {
        let raw = if self.rkey.trim().is_empty() {
            self.key
        } else {
            self.rkey
        };
        let key = extract_token(&raw)?;
        Some(Entry {
            class: normalize_class(self.r#type.as_ref()),
            key,
        })
    }
}

/// Parse entries from a raw payload, trying each accepted shape in order.
pub(crate) fn parse_entries(raw: &str) -> Vec<Entry> {
    // 1) Flat array: [{"type":"private","rkey":"...","ttl":...}, ...]
    if let Ok(arr) = serde_json::from_str::<Vec<RawEntry>>(raw) {
        let out: Vec<_> = arr.into_iter().filter_map(RawEntry::into_entry).collect();
        if !out.is_empty() {
            return out;
        }
    }

    // 2) Wrapped: {"data":[{"key":"..."} , ...]}
    if let Ok(wrapped) = serde_json::from_str::<Wrapped>(raw) {
        let out: Vec<_> = wrapped
            .data
            .into_iter()
            .filter_map(RawEntry::into_entry)
            .collect();
        if !out.is_empty() {
            return out;
        }
    }

    // 3) Generic scan of "rkey"/"key" string fields in arbitrary JSON.
    field_token_re()
        .captures_iter(raw)
        .filter_map(|c| extract_token(c.get(1)?.as_str()))
        .map(|key| Entry {
            class: CLASS_UNCLASSIFIED,
            key,
        })
        .collect()
}

/// Normalize a type marker to a token class.
///
/// Numeric markers map onto the known classes directly; descriptive strings
/// are folded case-insensitively; anything else is unclassified.
pub(crate) fn normalize_class(marker: Option<&JsonValue>) -> u32 {
    match marker {
        Some(JsonValue::Number(n)) => match n.as_u64() {
            Some(10) => CLASS_MEDIA,
            Some(20) => CLASS_LARGE,
            _ => CLASS_UNCLASSIFIED,
        },
        Some(JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "10" | "image" | "media" | "private" => CLASS_MEDIA,
            "20" | "file" | "offline" | "group" => CLASS_LARGE,
            _ => CLASS_UNCLASSIFIED,
        },
        _ => CLASS_UNCLASSIFIED,
    }
}

/// Extract a valid token from a bare value, URL, or query-style payload.
pub(crate) fn extract_token(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if is_token(s) {
        return Some(s.to_string());
    }
    if let Ok(u) = Url::parse(s) {
        if let Some((_, v)) = u.query_pairs().find(|(k, _)| k == "rkey") {
            if is_token(&v) {
                return Some(v.into_owned());
            }
        }
    }
    // Raw query payloads like "&rkey=xxxx" or "rkey=xxxx&ttl=...",
    // possibly percent-encoded once.
    let decoded = percent_decode(s);
    let trimmed = decoded
        .trim()
        .trim_start_matches('?')
        .trim_start_matches('&');
    for pair in trimmed.split('&') {
        if let Some(v) = pair.strip_prefix("rkey=") {
            if is_token(v) {
                return Some(v.to_string());
            }
        }
    }
    if let Some(c) = rkey_param_re().captures(&format!("&{trimmed}")) {
        let v = c.get(1)?.as_str().trim();
        if is_token(v) {
            return Some(v.to_string());
        }
    }
    None
}

fn is_token(s: &str) -> bool {
    s.len() >= MIN_TOKEN_LEN && token_re().is_match(s)
}

fn percent_decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hi = bytes.next();
            let lo = bytes.next();
            match (hi, lo) {
                (Some(h), Some(l)) => {
                    let hex = [h, l];
                    match u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or(""), 16) {
                        Ok(v) => out.push(v as char),
                        Err(_) => {
                            out.push('%');
                            out.push(h as char);
                            out.push(l as char);
                        }
                    }
                }
                _ => out.push('%'),
            }
        } else {
            out.push(b as char);
        }
    }
    out
}

/// Mask a key for logging, keeping the first and last four characters.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.chars().count() <= 8 {
        return key.to_string();
    }
    let head: String = key.chars().take(4).collect();
    let tail_start = key
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("{}...{}", head, &key[tail_start..])
}

/// Truncate a raw payload for log previews.
pub(crate) fn preview_raw(raw: &str) -> String {
    let raw = raw.trim().replace('\n', "\\n").replace('\r', "\\r");
    if raw.len() > 180 {
        let cut = raw
            .char_indices()
            .take_while(|(i, _)| *i <= 180)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}...", &raw[..cut])
    } else {
        raw
    }
}
