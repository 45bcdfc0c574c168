//! Ordered in-process key/value map with per-key expiry.
//!
//! Expired entries are invisible to every read and are purged lazily, the
//! first time an operation touches them.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::{Duration, Instant};

use crate::types::{EXPIRED_TTL, KeyString, NO_TTL, NValue, Ttl};

/// Longest expiry the engine stores (100 years); larger TTLs are clamped.
pub const MAX_TTL: Ttl = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct Entry {
    value: NValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn ttl(&self, now: Instant) -> Ttl {
        match self.expires_at {
            None => NO_TTL,
            Some(at) if at <= now => EXPIRED_TTL,
            // Round up so a live key never reports 0.
            Some(at) => {
                let left = at - now;
                let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
                Ttl::try_from(secs).unwrap_or(Ttl::MAX)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryEngine {
    entries: BTreeMap<KeyString, Entry>,
    max_entries: Option<usize>,
}

/// Outcome of [`MemoryEngine::insert`]. `ttl` is what the stored entry
/// reports right after the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { ttl: Ttl },
    Replaced { ttl: Ttl },
    /// The TTL was already spent: nothing is stored and any previous value
    /// is gone.
    Expired,
    Full,
}

impl MemoryEngine {
    pub fn new(max_entries: Option<usize>) -> Self {
        MemoryEngine {
            entries: BTreeMap::new(),
            max_entries,
        }
    }

    /// Removes every expired entry.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn live(&mut self, key: &KeyString) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    /// Value and remaining TTL of a live key.
    pub fn get(&mut self, key: &KeyString) -> Option<(NValue, Ttl)> {
        let now = Instant::now();
        self.live(key).map(|entry| (entry.value.clone(), entry.ttl(now)))
    }

    /// Stores `value`. `NO_TTL` stores it without expiry, a positive TTL
    /// sets one (clamped to [`MAX_TTL`]) and any other TTL removes the key,
    /// the same rule [`MemoryEngine::set_ttl`] applies.
    pub fn insert(&mut self, key: KeyString, value: NValue, ttl: Ttl) -> InsertOutcome {
        if is_spent(ttl) {
            self.remove(&key);
            return InsertOutcome::Expired;
        }
        let exists = self.live(&key).is_some();
        if !exists {
            self.purge_expired();
            if self.max_entries.is_some_and(|max| self.entries.len() >= max) {
                return InsertOutcome::Full;
            }
        }
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: expiry(ttl, now),
        };
        let ttl = entry.ttl(now);
        self.entries.insert(key, entry);
        if exists {
            InsertOutcome::Replaced { ttl }
        } else {
            InsertOutcome::Inserted { ttl }
        }
    }

    pub fn remove(&mut self, key: &KeyString) -> bool {
        self.live(key).is_some() && self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&mut self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Live keys in byte order.
    pub fn keys(&mut self) -> Vec<KeyString> {
        self.purge_expired();
        self.entries.keys().cloned().collect()
    }

    /// Live keys strictly after `start`, in byte order.
    pub fn keys_after(&mut self, start: &KeyString) -> Vec<KeyString> {
        self.purge_expired();
        self.entries
            .range((Bound::Excluded(start.clone()), Bound::Unbounded))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn ttl(&mut self, key: &KeyString) -> Ttl {
        let now = Instant::now();
        self.live(key).map_or(EXPIRED_TTL, |entry| entry.ttl(now))
    }

    /// Changes the expiry of a live key. `NO_TTL` removes the expiry, a
    /// non-positive TTL deletes the key. Returns false for missing keys.
    pub fn set_ttl(&mut self, key: &KeyString, ttl: Ttl) -> bool {
        if is_spent(ttl) {
            return self.remove(key);
        }
        let now = Instant::now();
        match self.live(key) {
            Some(entry) => {
                entry.expires_at = expiry(ttl, now);
                true
            }
            None => false,
        }
    }
}

fn is_spent(ttl: Ttl) -> bool {
    ttl != NO_TTL && ttl <= 0
}

fn expiry(ttl: Ttl, now: Instant) -> Option<Instant> {
    let secs = u64::try_from(ttl.min(MAX_TTL)).ok().filter(|secs| *secs > 0)?;
    now.checked_add(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::sync::Arc;

    fn value(text: &str) -> NValue {
        Arc::new(Value::from(text))
    }

    #[test]
    fn insert_replace_and_capacity() {
        let mut engine = MemoryEngine::new(Some(1));
        assert_eq!(engine.insert("a".into(), value("1"), NO_TTL), InsertOutcome::Inserted { ttl: NO_TTL });
        assert_eq!(engine.insert("a".into(), value("2"), NO_TTL), InsertOutcome::Replaced { ttl: NO_TTL });
        assert_eq!(engine.insert("b".into(), value("3"), NO_TTL), InsertOutcome::Full);
        assert_eq!(engine.get(&"a".into()).map(|(v, _)| v), Some(value("2")));
    }

    #[test]
    fn ttl_lifecycle() {
        let mut engine = MemoryEngine::new(None);
        engine.insert("k".into(), value("v"), NO_TTL);
        assert_eq!(engine.ttl(&"k".into()), NO_TTL);

        assert!(engine.set_ttl(&"k".into(), 100));
        let ttl = engine.ttl(&"k".into());
        assert!(ttl > 0 && ttl <= 100, "ttl {ttl}");

        assert!(engine.set_ttl(&"k".into(), NO_TTL));
        assert_eq!(engine.ttl(&"k".into()), NO_TTL);

        assert!(engine.set_ttl(&"k".into(), 0));
        assert_eq!(engine.ttl(&"k".into()), EXPIRED_TTL);
        assert!(!engine.set_ttl(&"missing".into(), 10));
    }

    #[test]
    fn insert_reports_the_stored_ttl() {
        let mut engine = MemoryEngine::new(None);
        assert_eq!(engine.insert("k".into(), value("v"), 60), InsertOutcome::Inserted { ttl: 60 });
        assert_eq!(
            engine.insert("k".into(), value("v"), Ttl::MAX),
            InsertOutcome::Replaced { ttl: MAX_TTL }
        );
        let ttl = engine.ttl(&"k".into());
        assert!(ttl > MAX_TTL - 5 && ttl <= MAX_TTL, "ttl {ttl}");

        assert!(engine.set_ttl(&"k".into(), Ttl::MAX));
        assert!(engine.ttl(&"k".into()) > 0);
    }

    #[test]
    fn spent_ttl_on_insert_removes_the_key() {
        let mut engine = MemoryEngine::new(None);
        engine.insert("k".into(), value("old"), NO_TTL);
        assert_eq!(engine.insert("k".into(), value("new"), 0), InsertOutcome::Expired);
        assert!(engine.get(&"k".into()).is_none());
        assert_eq!(engine.insert("k".into(), value("new"), -5), InsertOutcome::Expired);
        assert_eq!(engine.ttl(&"k".into()), EXPIRED_TTL);
    }

    #[test]
    fn expired_keys_are_invisible() {
        let mut engine = MemoryEngine::new(None);
        engine.insert("k".into(), value("v"), NO_TTL);
        engine.entries.get_mut(&KeyString::from("k")).unwrap().expires_at = Some(Instant::now());
        assert!(engine.get(&"k".into()).is_none());
        assert!(engine.is_empty());
    }

    #[test]
    fn keys_after_is_exclusive() {
        let mut engine = MemoryEngine::new(None);
        for key in ["a", "b", "c"] {
            engine.insert(key.into(), value(key), NO_TTL);
        }
        assert_eq!(engine.keys_after(&"a".into()), vec![KeyString::from("b"), KeyString::from("c")]);
        assert_eq!(engine.keys().len(), 3);
    }
}
