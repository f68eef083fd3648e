//! Database connection management with pragma configuration.

use super::migrations;
use crate::Error;
use std::path::Path;
use std::time::Duration;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// TTL-evicting search result cache backed by SQLite.
///
/// One row per `(query, model)` key. Entries older than the TTL are
/// deleted lazily on read; nothing sweeps in the background.
#[derive(Clone, Debug)]
pub struct SearchCache {
    pub(crate) conn: Connection,
    pub(crate) ttl: Duration,
}

impl SearchCache {
    /// Open the cache database at `path`.
    ///
    /// Creates the parent directory and the file if they don't exist,
    /// applies pragmas, and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, ttl).await
    }

    /// Open an in-memory cache for testing.
    pub async fn open_in_memory(ttl: Duration) -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, ttl).await
    }

    async fn init(conn: Connection, ttl: Duration) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, ttl })
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let cache = SearchCache::open_in_memory(Duration::from_secs(60)).await.unwrap();
        let version = cache
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cache/search-cache.sqlite");

        SearchCache::open(&path, Duration::from_secs(60)).await.unwrap();

        assert!(path.exists());
    }
}
