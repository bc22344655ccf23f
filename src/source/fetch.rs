use std::sync::Mutex;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::algo::cache::DocumentCache;
use crate::algo::url_normalize::cache_key;
use crate::config::{AnalyzerConfig, FetchConfig};
use crate::error::{Result, WordFreqError};

#[cfg(feature = "cache")]
use crate::algo::{cache, storage::CacheDb};

/// Retrieves the body of a URL as text.
pub trait Fetch: Send + Sync {
    fn fetch_text(&self, url: &Url) -> Result<String>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch_text(&self, url: &Url) -> Result<String> {
        (**self).fetch_text(url)
    }
}

/// Blocking HTTP fetcher. Every request uses the same timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "fetch failed");
            return Err(WordFreqError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        info!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

/// Content-addressed cache in front of another fetcher.
///
/// Keys are normalized URLs; the in-memory layer is a bounded LRU. With the
/// `cache` feature and a configured path, misses also consult a persistent
/// SQLite cache. Failed fetches are never cached.
pub struct CachedFetcher<F> {
    inner: F,
    memory: Mutex<DocumentCache>,
    #[cfg(feature = "cache")]
    db: Option<Mutex<CacheDb>>,
}

impl<F: Fetch> CachedFetcher<F> {
    pub fn new(inner: F, capacity: usize) -> Self {
        Self {
            inner,
            memory: Mutex::new(DocumentCache::new(capacity)),
            #[cfg(feature = "cache")]
            db: None,
        }
    }

    /// Build from config, opening the persistent cache when one is configured.
    pub fn from_config(inner: F, config: &AnalyzerConfig) -> Result<Self> {
        #[allow(unused_mut)]
        let mut fetcher = Self::new(inner, config.cache.capacity);
        #[cfg(feature = "cache")]
        if let Some(path) = &config.cache.path {
            fetcher = fetcher.with_db(CacheDb::open_or_create(path, config.cache.max_entries)?);
        }
        Ok(fetcher)
    }

    #[cfg(feature = "cache")]
    pub fn with_db(mut self, db: CacheDb) -> Self {
        self.db = Some(Mutex::new(db));
        self
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Number of documents held in memory.
    pub fn cached_len(&self) -> usize {
        self.memory.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Drop every in-memory entry. Returns how many were removed.
    pub fn clear_memory(&self) -> usize {
        self.memory.lock().map(|mut m| m.clear()).unwrap_or(0)
    }

    fn memory_get(&self, key: &str) -> Option<String> {
        self.memory.lock().ok().and_then(|mut m| m.get(key))
    }

    fn memory_put(&self, key: &str, body: &str) {
        if let Ok(mut m) = self.memory.lock() {
            m.put(key.to_string(), body.to_string());
        }
    }

    #[cfg(feature = "cache")]
    fn db_get(&self, key: &str) -> Option<String> {
        let db = self.db.as_ref()?.lock().ok()?;
        match db.get(key) {
            Ok(Some((meta, body))) if cache::is_valid(&meta) => Some(body),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "persistent cache lookup failed");
                None
            }
        }
    }

    #[cfg(feature = "cache")]
    fn db_put(&self, key: &str, body: &str) {
        let Some(db) = self.db.as_ref() else { return };
        if let Ok(db) = db.lock() {
            if let Err(e) = db.put(&cache::CacheMeta::new(key), body) {
                warn!(error = %e, "persistent cache write failed");
            }
        }
    }
}

impl<F: Fetch> Fetch for CachedFetcher<F> {
    fn fetch_text(&self, url: &Url) -> Result<String> {
        let key = cache_key(url);
        if let Some(body) = self.memory_get(&key) {
            debug!(%key, "memory cache hit");
            return Ok(body);
        }

        #[cfg(feature = "cache")]
        if let Some(body) = self.db_get(&key) {
            debug!(%key, "persistent cache hit");
            self.memory_put(&key, &body);
            return Ok(body);
        }

        let body = self.inner.fetch_text(url)?;
        self.memory_put(&key, &body);
        #[cfg(feature = "cache")]
        self.db_put(&key, &body);
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serves canned bodies by exact URL; unknown URLs fail with 404.
    #[derive(Default)]
    pub struct StubFetcher {
        pub pages: HashMap<String, String>,
        pub calls: AtomicUsize,
    }

    impl StubFetcher {
        pub fn with(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for StubFetcher {
        fn fetch_text(&self, url: &Url) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| WordFreqError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }
}
