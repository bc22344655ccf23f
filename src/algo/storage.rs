//! SQLite-backed persistent cache for fetched documents.
//!
//! Each document is keyed by the SipHash of its normalized URL key. The
//! table is bounded: after every insert the oldest rows beyond
//! `max_entries` are deleted. The storage layer is opt-in via the `cache`
//! feature.

use rusqlite::{params, Connection, OptionalExtension};

use super::cache::{key_hash, CacheMeta};
use crate::error::{Result, WordFreqError};

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> WordFreqError + '_ {
    move |e| WordFreqError::Cache(format!("{context}: {e}"))
}

/// SQLite-backed cache database for fetched documents.
pub struct CacheDb {
    conn: Connection,
    max_entries: usize,
}

impl CacheDb {
    /// Open (or create) a cache database at the given path.
    pub fn open_or_create(path: &str, max_entries: usize) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| WordFreqError::Cache(format!("failed to open cache DB at '{path}': {e}")))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err("failed to set PRAGMA"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS fetch_cache (
                key_hash    INTEGER NOT NULL UNIQUE,
                key         TEXT NOT NULL,
                version     TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                body        TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_fetch_cache_age
                ON fetch_cache(created_at);",
        )
        .map_err(db_err("failed to create cache schema"))?;

        Ok(Self {
            conn,
            max_entries: max_entries.clamp(1, i64::MAX as usize),
        })
    }

    /// Retrieve a cached document. Returns `None` on cache miss.
    pub fn get(&self, key: &str) -> Result<Option<(CacheMeta, String)>> {
        let hash = key_hash(key);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT key, version, created_at, body
                 FROM fetch_cache
                 WHERE key_hash = ?1",
            )
            .map_err(db_err("failed to prepare SELECT"))?;

        let result = stmt
            .query_row(params![hash as i64], |row| {
                let key: String = row.get(0)?;
                let version: String = row.get(1)?;
                let created_at: i64 = row.get(2)?;
                let body: String = row.get(3)?;
                Ok((key, version, created_at, body))
            })
            .optional()
            .map_err(db_err("failed to query cache"))?;

        Ok(result.map(|(key, version, created_at, body)| {
            let meta = CacheMeta {
                key_hash: hash,
                key,
                version,
                created_at: created_at as u64,
            };
            (meta, body)
        }))
    }

    /// Store (upsert) a document, then trim the table to `max_entries`.
    pub fn put(&self, meta: &CacheMeta, body: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO fetch_cache (key_hash, key, version, created_at, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(key_hash)
                 DO UPDATE SET key = excluded.key,
                               version = excluded.version,
                               created_at = excluded.created_at,
                               body = excluded.body",
                params![
                    meta.key_hash as i64,
                    meta.key,
                    meta.version,
                    meta.created_at as i64,
                    body,
                ],
            )
            .map_err(db_err("failed to upsert cache entry"))?;
        self.evict()?;
        Ok(())
    }

    /// Delete the oldest entries beyond `max_entries`. Returns rows removed.
    fn evict(&self) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM fetch_cache WHERE rowid IN (
                    SELECT rowid FROM fetch_cache
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT -1 OFFSET ?1
                 )",
                params![self.max_entries as i64],
            )
            .map_err(db_err("failed to evict cache entries"))
    }

    /// Remove entries whose key starts with `prefix` (e.g. a host), or all
    /// entries if `prefix` is None.
    pub fn invalidate(&self, prefix: Option<&str>) -> Result<usize> {
        match prefix {
            Some(p) => self
                .conn
                .execute(
                    "DELETE FROM fetch_cache WHERE substr(key, 1, length(?1)) = ?1",
                    params![p],
                )
                .map_err(db_err("failed to invalidate")),
            None => self
                .conn
                .execute("DELETE FROM fetch_cache", [])
                .map_err(db_err("failed to invalidate all")),
        }
    }

    /// Metadata about all cached documents, newest first.
    pub fn info(&self) -> Result<Vec<EntryInfo>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT key, version, created_at, length(CAST(body AS BLOB))
                 FROM fetch_cache
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(db_err("failed to prepare info query"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(EntryInfo {
                    key: row.get(0)?,
                    version: row.get(1)?,
                    created_at: row.get::<_, i64>(2)? as u64,
                    body_bytes: row.get::<_, i64>(3)? as usize,
                })
            })
            .map_err(db_err("failed to query info"))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(db_err("failed to read row"))?);
        }
        Ok(result)
    }

    /// Total size of the database file in bytes (approximate).
    pub fn db_size_bytes(&self) -> Result<u64> {
        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .map_err(db_err("failed to get page_count"))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .map_err(db_err("failed to get page_size"))?;
        Ok((page_count * page_size) as u64)
    }
}

/// Info record for a cached document (returned by `CacheDb::info()`).
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub key: String,
    pub version: String,
    pub created_at: u64,
    pub body_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(max: usize) -> CacheDb {
        CacheDb::open_or_create(":memory:", max).unwrap()
    }

    fn meta_at(key: &str, created_at: u64) -> CacheMeta {
        let mut meta = CacheMeta::new(key);
        meta.created_at = created_at;
        meta
    }

    #[test]
    fn open_or_create_in_memory() {
        let db = test_db(8);
        assert!(db.info().unwrap().is_empty());
    }

    #[test]
    fn put_and_get_roundtrip() {
        let db = test_db(8);
        let meta = CacheMeta::new("gutenberg.org/ebooks/1342.txt.utf-8");
        db.put(&meta, "It is a truth universally acknowledged").unwrap();

        let (got_meta, body) = db.get("gutenberg.org/ebooks/1342.txt.utf-8").unwrap().unwrap();
        assert_eq!(got_meta.key, meta.key);
        assert_eq!(got_meta.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(body, "It is a truth universally acknowledged");
    }

    #[test]
    fn get_miss_returns_none() {
        let db = test_db(8);
        assert!(db.get("nothing/here").unwrap().is_none());
    }

    #[test]
    fn put_upsert_overwrites() {
        let db = test_db(8);
        db.put(&meta_at("k", 1), "first").unwrap();
        db.put(&meta_at("k", 2), "second").unwrap();
        let (meta, body) = db.get("k").unwrap().unwrap();
        assert_eq!(meta.created_at, 2);
        assert_eq!(body, "second");
        assert_eq!(db.info().unwrap().len(), 1);
    }

    #[test]
    fn evicts_oldest_beyond_max() {
        let db = test_db(2);
        db.put(&meta_at("a", 10), "A").unwrap();
        db.put(&meta_at("b", 20), "B").unwrap();
        db.put(&meta_at("c", 30), "C").unwrap();
        assert!(db.get("a").unwrap().is_none());
        assert!(db.get("b").unwrap().is_some());
        assert!(db.get("c").unwrap().is_some());
    }

    #[test]
    fn invalidate_by_prefix() {
        let db = test_db(8);
        db.put(&CacheMeta::new("gutenberg.org/ebooks/1"), "x").unwrap();
        db.put(&CacheMeta::new("example.com/page"), "y").unwrap();
        assert_eq!(db.invalidate(Some("gutenberg.org")).unwrap(), 1);
        assert!(db.get("gutenberg.org/ebooks/1").unwrap().is_none());
        assert!(db.get("example.com/page").unwrap().is_some());
    }

    #[test]
    fn invalidate_all() {
        let db = test_db(8);
        db.put(&CacheMeta::new("a"), "x").unwrap();
        db.put(&CacheMeta::new("b"), "y").unwrap();
        assert_eq!(db.invalidate(None).unwrap(), 2);
        assert!(db.info().unwrap().is_empty());
    }

    #[test]
    fn info_includes_body_size() {
        let db = test_db(8);
        db.put(&CacheMeta::new("k"), &"w".repeat(1024)).unwrap();
        let info = db.info().unwrap();
        assert_eq!(info[0].body_bytes, 1024);
        assert_eq!(info[0].key, "k");
    }

    #[test]
    fn db_size_bytes_nonzero() {
        let db = test_db(8);
        assert!(db.db_size_bytes().unwrap() > 0);
    }
}
