//! Durable snapshot storage for per-session cart and wishlist state.
//!
//! Every mutation writes the full serialized container under a fixed
//! namespaced key (cache-aside write-through, not a transactional log), and
//! the container is restored verbatim on the next access, so session state
//! survives a process restart.

use crate::errors::ServiceError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Key namespaces. Fixed: changing one silently orphans stored snapshots.
pub const CART_NAMESPACE: &str = "storefront:cart";
pub const WISHLIST_NAMESPACE: &str = "storefront:wishlist";

/// Builds the storage key for a session under a namespace.
pub fn snapshot_key(namespace: &str, session: &str) -> String {
    format!("{}:{}", namespace, session)
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}

/// Redis-backed snapshot store used in production.
pub struct RedisSnapshotStore {
    client: Arc<redis::Client>,
}

impl RedisSnapshotStore {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::Connection, ServiceError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| ServiceError::CacheError(format!("redis connection failed: {}", e)))
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| ServiceError::CacheError(format!("redis SET failed: {}", e)))?;
        debug!(key = %key, "snapshot written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| ServiceError::CacheError(format!("redis GET failed: {}", e)))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| ServiceError::CacheError(format!("redis DEL failed: {}", e)))
    }
}

/// In-memory snapshot store for tests and single-node development.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    entries: DashMap<String, String>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        self.entries.remove(key);
        Ok(())
    }
}
