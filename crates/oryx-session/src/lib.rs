//! Per-user conversational state for the Oryx bot.
//!
//! Two JSON maps live under the state directory: `sessions.json` carries the
//! intro and handoff-offer markers, `handoff.json` marks which users a human
//! operator currently owns (presence = active). Every mutation is a
//! lock-guarded read-modify-write with an atomic rewrite; every read
//! substitutes empty defaults when a file is missing or corrupt so state
//! problems never block message processing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use oryx_core::{current_unix_timestamp_ms, within_window_ms, write_text_atomic};

mod store_locking;

use store_locking::acquire_lock;

/// Introduction suppression window: a greeting re-sends the intro only after
/// this much time has passed.
pub const INTRO_WINDOW_MS: u64 = 24 * 60 * 60 * 1_000;
/// Acceptance window for a bot-initiated handoff offer.
pub const HANDOFF_OFFER_WINDOW_MS: u64 = 60 * 60 * 1_000;

const SESSIONS_FILE: &str = "sessions.json";
const HANDOFF_FILE: &str = "handoff.json";
const DEFAULT_LOCK_WAIT_MS: u64 = 5_000;
const DEFAULT_LOCK_STALE_MS: u64 = 30_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Persisted per-user record in `sessions.json`.
pub struct SessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_intro_at_unix_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_offer_at_unix_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Persisted per-user record in `handoff.json`.
pub struct HandoffRecord {
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Combined view of one user's state, defaulted when nothing is stored.
pub struct Session {
    pub handoff_active: bool,
    pub last_intro_at_unix_ms: Option<u64>,
    pub handoff_offer_at_unix_ms: Option<u64>,
}

/// File-backed session store keyed by channel user id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_path: PathBuf,
    handoff_path: PathBuf,
    lock_wait_ms: u64,
    lock_stale_ms: u64,
}

impl SessionStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let state_dir = state_dir.as_ref();
        Self {
            sessions_path: state_dir.join(SESSIONS_FILE),
            handoff_path: state_dir.join(HANDOFF_FILE),
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
            lock_stale_ms: DEFAULT_LOCK_STALE_MS,
        }
    }

    pub fn set_lock_policy(&mut self, lock_wait_ms: u64, lock_stale_ms: u64) {
        self.lock_wait_ms = lock_wait_ms.max(1);
        self.lock_stale_ms = lock_stale_ms;
    }

    /// Returns the combined state for `user_id`, empty defaults included.
    /// Never fails.
    pub fn get(&self, user_id: &str) -> Session {
        let record = self
            .read_sessions()
            .remove(user_id)
            .unwrap_or_default();
        Session {
            handoff_active: self.is_handoff_active(user_id),
            last_intro_at_unix_ms: record.last_intro_at_unix_ms,
            handoff_offer_at_unix_ms: record.handoff_offer_at_unix_ms,
        }
    }

    pub fn is_handoff_active(&self, user_id: &str) -> bool {
        self.read_handoff()
            .get(user_id)
            .map(|record| record.active)
            .unwrap_or(false)
    }

    /// Activates or deactivates the human-operator flag. Deactivation removes
    /// the record entirely rather than storing `active = false`.
    pub fn set_handoff(&self, user_id: &str, active: bool) -> Result<()> {
        if user_id.is_empty() {
            return Ok(());
        }
        let _lock = self.acquire_store_lock(&self.handoff_path)?;
        let mut map = self.read_handoff();
        if active {
            map.insert(user_id.to_string(), HandoffRecord { active: true });
        } else {
            map.remove(user_id);
        }
        self.write_handoff(&map)
    }

    /// True when no intro was ever sent or the last one is older than 24h.
    pub fn should_send_intro(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        match self
            .read_sessions()
            .get(user_id)
            .and_then(|record| record.last_intro_at_unix_ms)
        {
            Some(last) => !within_window_ms(last, current_unix_timestamp_ms(), INTRO_WINDOW_MS),
            None => true,
        }
    }

    pub fn mark_intro_sent(&self, user_id: &str) -> Result<()> {
        self.update_session(user_id, |record| {
            record.last_intro_at_unix_ms = Some(current_unix_timestamp_ms());
            true
        })
    }

    pub fn set_handoff_offer(&self, user_id: &str) -> Result<()> {
        self.update_session(user_id, |record| {
            record.handoff_offer_at_unix_ms = Some(current_unix_timestamp_ms());
            true
        })
    }

    /// Removes the offer marker. The rest of the record is preserved.
    pub fn clear_handoff_offer(&self, user_id: &str) -> Result<()> {
        self.update_session(user_id, |record| {
            if record.handoff_offer_at_unix_ms.is_some() {
                record.handoff_offer_at_unix_ms = None;
                true
            } else {
                false
            }
        })
    }

    /// Activeness is derived from the stored marker at read time; an expired
    /// offer stays on disk until explicitly cleared but stops counting here.
    pub fn has_active_handoff_offer(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        self.read_sessions()
            .get(user_id)
            .and_then(|record| record.handoff_offer_at_unix_ms)
            .map(|offer_at| {
                within_window_ms(offer_at, current_unix_timestamp_ms(), HANDOFF_OFFER_WINDOW_MS)
            })
            .unwrap_or(false)
    }

    fn update_session(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut SessionRecord) -> bool,
    ) -> Result<()> {
        if user_id.is_empty() {
            return Ok(());
        }
        let _lock = self.acquire_store_lock(&self.sessions_path)?;
        let mut map = self.read_sessions();
        let record = map.entry(user_id.to_string()).or_default();
        if !apply(record) {
            return Ok(());
        }
        self.write_sessions(&map)
    }

    fn read_sessions(&self) -> BTreeMap<String, SessionRecord> {
        read_map_or_default(&self.sessions_path)
    }

    fn read_handoff(&self) -> BTreeMap<String, HandoffRecord> {
        read_map_or_default(&self.handoff_path)
    }

    fn write_sessions(&self, map: &BTreeMap<String, SessionRecord>) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        write_text_atomic(&self.sessions_path, &content)
    }

    fn write_handoff(&self, map: &BTreeMap<String, HandoffRecord>) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        write_text_atomic(&self.handoff_path, &content)
    }

    fn acquire_store_lock(&self, path: &Path) -> Result<store_locking::LockGuard> {
        acquire_lock(
            &path.with_extension("lock"),
            Duration::from_millis(self.lock_wait_ms),
            Duration::from_millis(self.lock_stale_ms),
        )
    }
}

fn read_map_or_default<T>(path: &Path) -> BTreeMap<String, T>
where
    T: for<'de> Deserialize<'de>,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return BTreeMap::new(),
    };
    if raw.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(error) => {
            warn!(path = %path.display(), %error, "corrupt state file, using empty defaults");
            BTreeMap::new()
        }
    }
}
