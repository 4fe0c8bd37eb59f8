//! Push delivery tokens per identity.
//!
//! Tokens form a set per identity: appending a token twice leaves one copy,
//! and nothing here removes a token.

use super::connection::LocalDb;
use crate::Error;
use async_trait::async_trait;
use tokio_rusqlite::params;

/// Account-side storage of delivery tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Union `token` into the identity's token set.
    ///
    /// Returns true when the token was not present before.
    async fn append_token(&self, identity: &str, token: &str) -> Result<bool, Error>;

    async fn tokens(&self, identity: &str) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl TokenStore for LocalDb {
    async fn append_token(&self, identity: &str, token: &str) -> Result<bool, Error> {
        let identity = identity.to_string();
        let token = token.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO device_tokens (identity, token, added_at) VALUES (?1, ?2, ?3)",
                    params![identity, token, now],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn tokens(&self, identity: &str) -> Result<Vec<String>, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT token FROM device_tokens WHERE identity = ?1 ORDER BY added_at, token")?;
                let tokens = stmt
                    .query_map(params![identity], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(tokens)
            })
            .await
            .map_err(Error::from)
    }
}
