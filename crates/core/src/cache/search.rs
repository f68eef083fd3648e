//! Search cache operations.
//!
//! Rows hold `{query, model, timestamp, result}` keyed by [`cache_key`].

use super::connection::SearchCache;
use super::hash::cache_key;
use crate::Error;
use crate::result::SearchResult;
use chrono::{DateTime, TimeDelta, Utc};
use tokio_rusqlite::{params, rusqlite};

impl SearchCache {
    /// Get a fresh cached result for `(query, model)`.
    ///
    /// Returns None if no entry exists. An entry older than the TTL is
    /// deleted and None is returned.
    pub async fn get(&self, query: &str, model: &str) -> Result<Option<SearchResult>, Error> {
        let key = cache_key(query, model);
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);

        self.conn
            .call(move |conn| -> Result<Option<SearchResult>, Error> {
                let row = conn.query_row(
                    "SELECT timestamp, result_json FROM search_cache WHERE key_hash = ?1",
                    params![key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                );

                let (timestamp, result_json) = match row {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let stored_at = DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| Error::CorruptEntry { key: key.clone(), reason: e.to_string() })?
                    .with_timezone(&Utc);

                if Utc::now() - stored_at > ttl {
                    tracing::debug!(key = %key, "cache entry expired");
                    conn.execute("DELETE FROM search_cache WHERE key_hash = ?1", params![key])?;
                    return Ok(None);
                }

                serde_json::from_str(&result_json)
                    .map(Some)
                    .map_err(|e| Error::CorruptEntry { key, reason: e.to_string() })
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the entry for `(query, model)`, stamped now.
    pub async fn set(&self, query: &str, model: &str, result: &SearchResult) -> Result<(), Error> {
        self.set_at(query, model, result, Utc::now()).await
    }

    /// Insert or overwrite the entry for `(query, model)` with an explicit timestamp.
    pub async fn set_at(
        &self, query: &str, model: &str, result: &SearchResult, timestamp: DateTime<Utc>,
    ) -> Result<(), Error> {
        let key = cache_key(query, model);
        let query = query.to_string();
        let model = model.to_string();
        let result_json = serde_json::to_string(result)
            .map_err(|e| Error::CorruptEntry { key: key.clone(), reason: e.to_string() })?;
        let timestamp = timestamp.to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO search_cache (key_hash, query, model, timestamp, result_json)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        query = excluded.query,
                        model = excluded.model,
                        timestamp = excluded.timestamp,
                        result_json = excluded.result_json",
                    params![key, query, model, timestamp, result_json],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry regardless of age.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM search_cache", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a row exists for `(query, model)`, fresh or not.
    ///
    /// Does not apply TTL expiry.
    pub async fn contains(&self, query: &str, model: &str) -> Result<bool, Error> {
        let key = cache_key(query, model);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM search_cache WHERE key_hash = ?1)",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries, including stale ones not yet read.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
