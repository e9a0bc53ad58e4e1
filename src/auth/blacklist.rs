// Token revocation store
//
// Revoked token identifiers live in an external key-value store with a TTL
// equal to the remaining lifetime of the token they revoke. Presence of an
// entry is the sole revocation signal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Revocation store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Value stored under a blacklisted token identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationEntry {
    pub jti: String,
    pub revoked_at: DateTime<Utc>,
}

impl RevocationEntry {
    pub fn new(jti: &str) -> Self {
        Self {
            jti: jti.to_string(),
            revoked_at: Utc::now(),
        }
    }
}

/// Narrow key-value interface the session core requires of the external store
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn insert(
        &self,
        jti: &str,
        entry: &RevocationEntry,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    async fn contains(&self, jti: &str) -> Result<bool, StoreError>;

    async fn remove(&self, jti: &str) -> Result<(), StoreError>;
}

/// Key under which a revoked identifier is stored
fn blacklist_key(jti: &str) -> String {
    format!("token:blacklist:{}", jti)
}

/// Redis-backed revocation store
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn insert(
        &self,
        jti: &str,
        entry: &RevocationEntry,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_string(entry)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(blacklist_key(jti), value, ttl_secs).await?;
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(blacklist_key(jti)).await?;
        Ok(exists)
    }

    async fn remove(&self, jti: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(blacklist_key(jti)).await?;
        Ok(())
    }
}

/// In-process revocation store for tests and local development
///
/// Honors TTLs by recording an expiry instant per entry.
#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: Mutex<HashMap<String, (RevocationEntry, Instant)>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("revocation store lock poisoned")
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn insert(
        &self,
        jti: &str,
        entry: &RevocationEntry,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .expect("revocation store lock poisoned")
            .insert(jti.to_string(), (entry.clone(), deadline));
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, StoreError> {
        let entries = self.entries.lock().expect("revocation store lock poisoned");
        Ok(entries
            .get(jti)
            .map(|(_, deadline)| *deadline > Instant::now())
            .unwrap_or(false))
    }

    async fn remove(&self, jti: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("revocation store lock poisoned")
            .remove(jti);
        Ok(())
    }
}
