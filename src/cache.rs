//! Cache entries with expiry, and the assembled verse-text cache

use crate::words::VerseKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Default lifetime of a dataset entry (24 hours)
pub const EXPIRY_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self { now: AtomicI64::new(now) }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cached value stamped with the time it was fetched.
///
/// The timestamp travels with the value into persistent storage, so an entry
/// promoted from disk keeps the age it had when first fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    pub fn is_valid(&self, now: i64, expiry_ms: i64) -> bool {
        now - self.timestamp < expiry_ms
    }
}

/// Assembled verse strings for the session. No expiry, no eviction.
#[derive(Default)]
pub struct VerseTextCache {
    entries: Mutex<HashMap<VerseKey, String>>,
}

impl VerseTextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &VerseKey) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: VerseKey, text: String) {
        self.entries.lock().unwrap().insert(key, text);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry::new("x", 1_000);
        assert!(entry.is_valid(1_000, EXPIRY_WINDOW_MS));
        assert!(entry.is_valid(1_000 + EXPIRY_WINDOW_MS - 1, EXPIRY_WINDOW_MS));
        assert!(!entry.is_valid(1_000 + EXPIRY_WINDOW_MS, EXPIRY_WINDOW_MS));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = CacheEntry::new(vec![1, 2], 42);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"data":[1,2],"timestamp":42}"#);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_millis(), 15);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn test_verse_cache_keeps_empty_strings() {
        let cache = VerseTextCache::new();
        cache.insert(VerseKey::new(1, 1), String::new());
        assert_eq!(cache.get(&VerseKey::new(1, 1)), Some(String::new()));
        assert_eq!(cache.get(&VerseKey::new(1, 2)), None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
