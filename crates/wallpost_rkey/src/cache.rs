//! Concurrently-read cache of resource keys.

use crate::parse::{self, Entry, CLASS_LARGE, CLASS_MEDIA, CLASS_UNCLASSIFIED};
use std::collections::HashMap;
use std::sync::RwLock;
use wallpost_interface::SessionProvider;

// URL substrings indicating a large-file/offline resource.
const LARGE_FILE_MARKERS: [&str; 3] = ["weiyun", "offline", "ftn"];

#[derive(Debug, Default)]
struct CacheState {
    by_class: HashMap<u32, String>,
    fallback: String,
}

/// Process-wide cache of short-lived resource keys, keyed by token class.
///
/// Owned by the process and shared by `Arc`; a single reader/writer lock
/// covers the class map and the unclassified fallback. Consistency is
/// per-slot: a reader may observe one class updated and another stale from
/// the same payload.
///
/// # Examples
///
/// ```
/// use wallpost_rkey::ResourceKeyCache;
///
/// let cache = ResourceKeyCache::new();
/// let (key, changed) = cache.update_from_raw(r#"[{"type":"private","rkey":"AAAAAAAA"}]"#);
/// assert_eq!(key.as_deref(), Some("AAAAAAAA"));
/// assert!(changed);
/// assert_eq!(cache.get().as_deref(), Some("AAAAAAAA"));
/// ```
#[derive(Debug, Default)]
pub struct ResourceKeyCache {
    state: RwLock<CacheState>,
}

impl ResourceKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferred key: media class first, then large-file class, then the
    /// unclassified fallback.
    pub fn get(&self) -> Option<String> {
        let state = self.read();
        for class in [CLASS_MEDIA, CLASS_LARGE] {
            if let Some(v) = state.by_class.get(&class) {
                if !v.is_empty() {
                    return Some(v.clone());
                }
            }
        }
        (!state.fallback.is_empty()).then(|| state.fallback.clone())
    }

    /// Current key for a specific class.
    pub fn get_by_class(&self, class: u32) -> Option<String> {
        let state = self.read();
        state.by_class.get(&class).cloned().filter(|v| !v.is_empty())
    }

    /// Candidate keys for a URL, in descending likelihood of correctness.
    ///
    /// URLs carrying a large-file/offline marker rank the large-file class
    /// first; every other known class follows, then the fallback, all
    /// de-duplicated preserving first-seen order.
    pub fn candidates_for_url(&self, url: &str) -> Vec<String> {
        let low = url.trim().to_ascii_lowercase();
        let order = if LARGE_FILE_MARKERS.iter().any(|m| low.contains(m)) {
            [CLASS_LARGE, CLASS_MEDIA]
        } else {
            [CLASS_MEDIA, CLASS_LARGE]
        };
        self.candidates_by_order(&order)
    }

    /// Extract key(s) from a raw upstream payload and update the cache.
    ///
    /// Returns the first extracted key (if any) and whether any slot actually
    /// changed, so callers can skip redundant downstream notification.
    /// Feeding the same payload twice reports `changed == false` the second
    /// time.
    pub fn update_from_raw(&self, raw: &str) -> (Option<String>, bool) {
        let mut raw = raw.trim();
        if raw.is_empty() {
            return (None, false);
        }

        // Some adapters return a JSON-escaped payload string; unquote once.
        let unquoted;
        if let Ok(s) = serde_json::from_str::<String>(raw) {
            let s = s.trim();
            if !s.is_empty() && s != raw {
                unquoted = s.to_string();
                raw = &unquoted;
            }
        }

        let entries = parse::parse_entries(raw);
        if entries.is_empty() {
            // Raw token/URL fallback.
            if let Some(key) = parse::extract_token(raw) {
                let changed = self.set_entry(&Entry {
                    class: CLASS_UNCLASSIFIED,
                    key: key.clone(),
                });
                tracing::debug!(
                    key = %parse::mask_key(&key),
                    changed,
                    "resource key update from bare token"
                );
                return (Some(key), changed);
            }
            tracing::debug!(
                raw_len = raw.len(),
                raw_preview = %parse::preview_raw(raw),
                "resource key payload empty or unparseable"
            );
            return (None, false);
        }

        let mut first = None;
        let mut changed = false;
        for entry in &entries {
            if first.is_none() {
                first = Some(entry.key.clone());
            }
            if self.set_entry(entry) {
                changed = true;
            }
        }
        if let Some(key) = &first {
            tracing::debug!(
                key = %parse::mask_key(key),
                changed,
                entries = entries.len(),
                "resource key update from parsed payload"
            );
        }
        (first, changed)
    }

    /// Ask every connected bot session for its key report, stopping at the
    /// first session that yields any key. Returns the resulting best key.
    pub fn refresh_from_bots(&self, sessions: &dyn SessionProvider) -> Option<String> {
        tracing::debug!("resource key refresh from bot sessions");
        sessions.for_each_session(&mut |session| {
            let raw = session.raw_resource_key_report();
            let (key, changed) = self.update_from_raw(&raw);
            match key {
                Some(key) => {
                    tracing::info!(
                        key = %parse::mask_key(&key),
                        changed,
                        "resource key obtained from bot session"
                    );
                    false
                }
                None => true,
            }
        });
        let best = self.get();
        match &best {
            Some(key) => tracing::debug!(
                selected = %parse::mask_key(key),
                "resource key refresh done"
            ),
            None => tracing::debug!("resource key refresh yielded nothing"),
        }
        best
    }

    // Compare-and-set one entry; the fallback slot tracks the most recent
    // value regardless of class.
    fn set_entry(&self, entry: &Entry) -> bool {
        if entry.key.is_empty() {
            return false;
        }
        let mut state = self.write();
        let mut changed = false;
        if entry.class != CLASS_UNCLASSIFIED {
            let slot = state.by_class.entry(entry.class).or_default();
            if *slot != entry.key {
                slot.clone_from(&entry.key);
                changed = true;
            }
        }
        if state.fallback != entry.key {
            state.fallback.clone_from(&entry.key);
            changed = true;
        }
        changed
    }

    fn candidates_by_order(&self, order: &[u32]) -> Vec<String> {
        let state = self.read();
        let mut out = Vec::with_capacity(state.by_class.len() + 1);
        let mut push = |v: &str, out: &mut Vec<String>| {
            if !v.is_empty() && !out.iter().any(|x| x == v) {
                out.push(v.to_string());
            }
        };
        for class in order {
            if let Some(v) = state.by_class.get(class) {
                push(v, &mut out);
            }
        }
        let mut rest: Vec<_> = state
            .by_class
            .iter()
            .filter(|(class, _)| !order.contains(class))
            .collect();
        rest.sort_by_key(|(class, _)| **class);
        for (_, v) in rest {
            push(v, &mut out);
        }
        push(&state.fallback, &mut out);
        out
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
