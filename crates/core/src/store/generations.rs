//! Cache generations: named, versioned sets of request/response pairs.
//!
//! A generation is created on open, filled by put, and only ever removed as a
//! whole. There is no per-entry expiry.

use super::connection::LocalDb;
use super::hash::compute_request_key;
use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Normalized request identity used to address cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    pub fn hash(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A replayable response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

/// Storage for cache generations.
///
/// Only the interception agent writes through this interface.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the named generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error>;

    /// Insert or overwrite the entry for `key`.
    ///
    /// Only [`CacheStore::open`] creates generations: a write into a
    /// generation that does not exist (or was deleted) is dropped.
    async fn put(&self, generation: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error>;

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error>;

    async fn generation_names(&self) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStore for LocalDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body, stored_at
                     FROM cache_entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?, row.get(3)?))
                });

                match result {
                    Ok((status, headers_json, body, stored_at)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::InvalidInput(format!("corrupt cached headers: {e}")))?;
                        Ok(Some(CachedResponse { status, headers, body, stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error> {
        let generation = generation.to_string();
        let key = key.clone();
        let response = response.clone();
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        let target = generation.clone();
        let stored = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_generations WHERE name = ?1)",
                    params![generation],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(false);
                }
                conn.execute(
                    "INSERT INTO cache_entries (
                        generation, key_hash, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(generation, key_hash) DO UPDATE SET
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        generation,
                        key.hash(),
                        key.method,
                        key.url,
                        response.status,
                        headers_json,
                        response.body,
                        response.stored_at,
                    ],
                )?;
                Ok(true)
            })
            .await
            .map_err(Error::from)?;

        if !stored {
            tracing::debug!(generation = %target, "put into missing generation dropped");
        }
        Ok(())
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_generations WHERE name = ?1", params![generation])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_generations ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}

impl LocalDb {
    /// Number of entries held by a generation.
    pub async fn generation_size(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE generation = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
