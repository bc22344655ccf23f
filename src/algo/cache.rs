//! Fetch-cache types: key hashing, entry metadata, and the in-memory LRU.
//!
//! This module is always compiled (no feature gate). Only the persistent
//! backend (`storage.rs`) requires the `cache` feature with rusqlite.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

/// Metadata stored alongside a cached document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    /// SipHash of the normalized cache key.
    pub key_hash: u64,
    /// Normalized cache key (see `url_normalize::cache_key`).
    pub key: String,
    /// Crate version when the entry was created (detects upgrades).
    pub version: String,
    /// Unix timestamp when the entry was created.
    pub created_at: u64,
}

impl CacheMeta {
    /// Create metadata for `key` with the current version and timestamp.
    pub fn new(key: &str) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            key_hash: key_hash(key),
            key: key.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at,
        }
    }
}

/// Stable 64-bit hash of a cache key.
pub fn key_hash(key: &str) -> u64 {
    let mut hasher = SipHasher13::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// A persisted entry is usable only if it was written by this crate version.
pub fn is_valid(meta: &CacheMeta) -> bool {
    meta.version == env!("CARGO_PKG_VERSION")
}

/// Bounded in-memory document cache, least-recently-used eviction.
pub struct DocumentCache {
    entries: LruCache<String, String>,
}

impl DocumentCache {
    /// A cache holding at most `capacity` documents (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a document, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    /// Insert a document, evicting the least recently used one when full.
    pub fn put(&mut self, key: String, body: String) {
        self.entries.put(key, body);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }
}
