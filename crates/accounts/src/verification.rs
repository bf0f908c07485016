//! Phone verification records: existence-only markers written by the
//! out-of-band verification flow and consumed by registration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::Mutex;

/// Lifetime of a record written through [`VerificationStore::mark_verified`]
/// when the caller does not pick one.
pub const DEFAULT_VERIFICATION_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn exists(&self, phone_number: &str) -> Result<bool, VerificationError>;
    async fn delete(&self, phone_number: &str) -> Result<(), VerificationError>;
    async fn mark_verified(
        &self,
        phone_number: &str,
        ttl: Duration,
    ) -> Result<(), VerificationError>;
}

/// Records stored as `<prefix><phone>` keys with a Redis expiry.
#[derive(Clone)]
pub struct RedisVerificationStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisVerificationStore {
    pub fn new(conn: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, phone_number: &str) -> String {
        format!("{}{}", self.key_prefix, phone_number)
    }
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn exists(&self, phone_number: &str) -> Result<bool, VerificationError> {
        let mut conn = self.conn.clone();
        let present: bool = conn.exists(self.key(phone_number)).await?;
        Ok(present)
    }

    async fn delete(&self, phone_number: &str) -> Result<(), VerificationError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(phone_number)).await?;
        Ok(())
    }

    async fn mark_verified(
        &self,
        phone_number: &str,
        ttl: Duration,
    ) -> Result<(), VerificationError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.key(phone_number))
            .arg(1)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Process-local records with per-entry deadlines. Only suitable for a
/// single instance; records vanish on restart.
#[derive(Clone, Default)]
pub struct InMemoryVerificationStore {
    inner: Arc<Mutex<HashMap<String, Instant>>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(map: &mut HashMap<String, Instant>) {
        let now = Instant::now();
        map.retain(|_, deadline| *deadline > now);
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn exists(&self, phone_number: &str) -> Result<bool, VerificationError> {
        let mut guard = self.inner.lock().await;
        Self::prune(&mut guard);
        Ok(guard.contains_key(phone_number))
    }

    async fn delete(&self, phone_number: &str) -> Result<(), VerificationError> {
        let mut guard = self.inner.lock().await;
        guard.remove(phone_number);
        Ok(())
    }

    async fn mark_verified(
        &self,
        phone_number: &str,
        ttl: Duration,
    ) -> Result<(), VerificationError> {
        let mut guard = self.inner.lock().await;
        Self::prune(&mut guard);
        guard.insert(phone_number.to_string(), Instant::now() + ttl);
        Ok(())
    }
}
