//! In-memory system-settings cache.
//!
//! Key → `(value, expiry)`. TTL `0` bypasses the cache entirely (always hits
//! the backing store); `-1` caches forever; a positive TTL expires against
//! the monotonic clock. Any write invalidates the key. This is the one spot
//! in the ORM that's allowed to swallow a backing-store error: settings are
//! read on hot paths, and falling back to a caller-supplied default beats
//! failing the request.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct Entry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

pub struct SettingsCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// `ttl_seconds`: `0` = bypass, `-1` = forever, `>0` = expires after that
    /// many seconds.
    pub fn get(&self, key: &str, ttl_seconds: i64) -> Option<serde_json::Value> {
        if ttl_seconds == 0 {
            return None;
        }
        let entries = self.entries.read().expect("settings cache poisoned");
        let entry = entries.get(key)?;
        match entry.expires_at {
            Some(exp) if Instant::now() >= exp => None,
            _ => Some(entry.value.clone()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl_seconds: i64) {
        if ttl_seconds == 0 {
            return;
        }
        let expires_at = if ttl_seconds < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs(ttl_seconds as u64))
        };
        let mut entries = self.entries.write().expect("settings cache poisoned");
        entries.insert(key.into(), Entry { value, expires_at });
    }

    /// Writes to the backing store invalidate the cached value.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().expect("settings cache poisoned");
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ttl_zero_always_bypasses() {
        let cache = SettingsCache::new();
        cache.set("k", json!(1), 0);
        assert_eq!(cache.get("k", 0), None);
    }

    #[test]
    fn ttl_negative_one_caches_forever() {
        let cache = SettingsCache::new();
        cache.set("k", json!("v"), -1);
        assert_eq!(cache.get("k", -1), Some(json!("v")));
    }

    #[test]
    fn write_invalidates_key() {
        let cache = SettingsCache::new();
        cache.set("k", json!(1), -1);
        cache.invalidate("k");
        assert_eq!(cache.get("k", -1), None);
    }

    #[test]
    fn positive_ttl_expires() {
        let cache = SettingsCache::new();
        cache.set("k", json!(1), 1);
        assert_eq!(cache.get("k", 1), Some(json!(1)));
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(cache.get("k", 1), None);
    }
}
