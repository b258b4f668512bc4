//! TTL-Aware Key-Value Store
//!
//! This module implements the core store for KegDB: a single map from key to
//! entry, guarded by one coarse lock. Every operation (from any connection or
//! from the background sweeper) serializes on that lock, which makes each
//! method atomic and linearizable relative to every other. The lock is held
//! only for the duration of one map operation, never across network I/O.
//!
//! ## Expiry Model
//!
//! Keys with a TTL are expired in two independent ways:
//! 1. **Lazy**: every read-path operation treats a past-deadline entry as
//!    absent and removes it on the spot. This bounds staleness on reads.
//! 2. **Active**: a background sweeper (see [`crate::store::sweeper`])
//!    periodically removes every expired entry. This bounds memory held by
//!    expired keys that are never read again.
//!
//! Timestamps use [`tokio::time::Instant`] so tests can run on a paused
//! clock and advance time deterministically instead of sleeping.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::store::glob::GlobPattern;

/// A stored value with its optional absolute expiry deadline.
///
/// `expires_at == None` means the entry never expires implicitly.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// Absolute deadline after which the entry is treated as absent
    pub expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// The in-memory key-value store.
///
/// All state lives behind one mutex; there is no per-key locking and no
/// sharding. The store is a plain value owned by its caller (wrap it in an
/// [`std::sync::Arc`] to share it across connection tasks), so independent
/// instances can coexist for isolated testing.
///
/// # Example
///
/// ```
/// use kegdb::store::Store;
/// use bytes::Bytes;
///
/// let store = Store::new();
/// store.set("name".to_string(), Bytes::from("keg"), None);
/// assert_eq!(store.get("name"), Some(Bytes::from("keg")));
/// ```
#[derive(Debug, Default)]
pub struct Store {
    data: Mutex<HashMap<String, Entry>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts or unconditionally overwrites a key.
    ///
    /// Overwriting clears any prior expiry. `ttl = None` means the key never
    /// expires; `ttl = Some(d)` sets the deadline to now + `d`.
    pub fn set(&self, key: String, value: Bytes, ttl: Option<Duration>) {
        let mut data = self.data.lock().unwrap();
        data.insert(key, Entry::new(value, ttl));
    }

    /// Returns the value for a key, or `None` if the key is absent or
    /// expired. An expired entry is removed as a side effect; a live read
    /// has no side effect.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                data.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Removes a key.
    ///
    /// Returns `true` iff the key was present, live or expired.
    pub fn delete(&self, key: &str) -> bool {
        let mut data = self.data.lock().unwrap();
        data.remove(key).is_some()
    }

    /// Returns whether a key is live, with the same lazy-expiry semantics
    /// as [`Store::get`]: an expired key is removed and reported absent.
    pub fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                data.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Clears the expiry of an existing key, making it persistent.
    ///
    /// This applies even to a key that is logically expired but not yet
    /// swept: the entry is still resident, so clearing its deadline revives
    /// it. Returns `false` if the key is absent.
    pub fn persist(&self, key: &str) -> bool {
        let mut data = self.data.lock().unwrap();
        match data.get_mut(key) {
            Some(entry) => {
                entry.expires_at = None;
                true
            }
            None => false,
        }
    }

    /// Sets the expiry of an existing key to now + `ttl`, overwriting any
    /// prior deadline. A zero `ttl` expires the key on its next check.
    /// Returns `false` if the key is absent.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        match data.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            None => false,
        }
    }

    /// Returns the remaining time-to-live of a key in whole seconds.
    ///
    /// - `-2` if the key does not exist
    /// - `-1` if the key exists but has no expiry
    /// - otherwise the remaining seconds, floored
    ///
    /// A key whose deadline has passed is removed and reported as `-2`.
    pub fn ttl(&self, key: &str) -> i64 {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        match data.get(key) {
            None => -2,
            Some(entry) => match entry.expires_at {
                None => -1,
                Some(exp) if now >= exp => {
                    data.remove(key);
                    -2
                }
                Some(exp) => (exp - now).as_secs() as i64,
            },
        }
    }

    /// Returns all live keys matching a glob pattern.
    ///
    /// Patterns use single-segment shell-filename semantics: `*` and `?`
    /// match any run / single character except `/`, `[...]` matches a
    /// character class, `\` escapes. A malformed pattern matches nothing.
    ///
    /// Any expired key encountered during the scan is removed
    /// opportunistically.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        let pattern = GlobPattern::compile(pattern);
        let mut data = self.data.lock().unwrap();
        let mut matching = Vec::new();
        data.retain(|key, entry| {
            if entry.is_expired_at(now) {
                return false;
            }
            if pattern.matches(key) {
                matching.push(key.clone());
            }
            true
        });
        matching
    }

    /// Moves the entry under `old` to `new`, value and expiry unchanged,
    /// overwriting any existing entry under `new`.
    ///
    /// The liveness check is part of the same critical section as the move:
    /// returns `false` if `old` is absent or expired (an expired `old` is
    /// removed), so callers need no separate pre-check.
    pub fn rename(&self, old: &str, new: &str) -> bool {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        match data.remove(old) {
            Some(entry) if !entry.is_expired_at(now) => {
                data.insert(new.to_string(), entry);
                true
            }
            // An expired old key stays removed.
            Some(_) => false,
            None => false,
        }
    }

    /// Atomically discards all entries.
    pub fn flush_all(&self) {
        let mut data = self.data.lock().unwrap();
        data.clear();
    }

    /// Removes every entry past its expiry under a single lock acquisition.
    ///
    /// Called by the background sweeper each tick; tests can call it
    /// directly to trigger exactly one deterministic sweep.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired_at(now));
        before - data.len()
    }

    /// Number of resident entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
