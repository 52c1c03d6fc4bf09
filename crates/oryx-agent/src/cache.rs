use std::collections::HashMap;
use std::sync::Mutex;

use oryx_core::{current_unix_timestamp_ms, within_window_ms};

/// Time-to-live for cached generation answers.
pub const RESPONSE_CACHE_TTL_MS: u64 = 60 * 60 * 1_000;

const CACHE_KEY_MAX_CHARS: usize = 50;

/// Derives the cache key: the first 50 characters of the lower-cased,
/// trimmed user text.
pub fn cache_key(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .take(CACHE_KEY_MAX_CHARS)
        .collect()
}

#[derive(Debug)]
struct CacheEntry {
    text: String,
    written_at_unix_ms: u64,
}

/// In-memory, time-boxed map from normalized-query keys to generated
/// answers. Constructed once at startup and injected into the orchestrator;
/// expiry is lazy, checked on read, and entries are never swept in bulk.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached answer, removing and ignoring entries past the TTL.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().expect("response cache poisoned");
        let fresh = entries.get(key).is_some_and(|entry| {
            within_window_ms(
                entry.written_at_unix_ms,
                current_unix_timestamp_ms(),
                RESPONSE_CACHE_TTL_MS,
            )
        });
        if !fresh {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.text.clone())
    }

    /// Stores an answer, replacing any prior entry for the key.
    pub fn put(&self, key: &str, text: &str) {
        self.put_with_timestamp(key, text, current_unix_timestamp_ms());
    }

    pub(crate) fn put_with_timestamp(&self, key: &str, text: &str, written_at_unix_ms: u64) {
        let mut entries = self.entries.lock().expect("response cache poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                text: text.to_string(),
                written_at_unix_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("response cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
