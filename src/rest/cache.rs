/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Store for raw response bodies keyed by the encoded request.
///
/// The client consults an installed cache before issuing a network call and
/// populates it afterwards. Eviction, bounding and persistence are left to the
/// implementation; [`SimpleCache`] is the unbounded in-memory default.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Bytes>;
    fn set(&self, key: &str, value: Bytes);
    fn contains(&self, key: &str) -> bool;
}

/// Unbounded in-memory [`ResponseCache`].
#[derive(Default)]
pub struct SimpleCache {
    entries: Mutex<HashMap<String, Bytes>>,
}

impl SimpleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for SimpleCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Bytes) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value);
    }

    fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_contains_roundtrip() {
        let cache = SimpleCache::new();
        assert!(!cache.contains("k"));
        assert!(cache.get("k").is_none());

        cache.set("k", Bytes::from_static(b"body"));
        assert!(cache.contains("k"));
        assert_eq!(cache.get("k").unwrap(), Bytes::from_static(b"body"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = SimpleCache::new();
        cache.set("k", Bytes::from_static(b"a"));
        cache.set("k", Bytes::from_static(b"b"));
        assert_eq!(cache.get("k").unwrap(), Bytes::from_static(b"b"));
        assert_eq!(cache.len(), 1);
    }
}
