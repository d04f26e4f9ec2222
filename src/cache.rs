/// Redis-backed ephemeral store
///
/// Holds the two kinds of short-lived state the service keeps outside
/// PostgreSQL: refresh-token revocation markers and password recovery
/// codes. Both carry a TTL so Redis expires them on its own; nothing
/// here is ever the source of truth for account data.

use std::sync::Arc;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tokio::sync::RwLock;

use crate::auth::session::RevocationStore;
use crate::configuration::RedisSettings;
use crate::error::AppError;

/// Recovery codes live for fifteen minutes.
pub const RECOVERY_CODE_TTL_SECONDS: u64 = 900;

#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<RwLock<MultiplexedConnection>>,
}

impl RedisCache {
    /// Connect and hold a multiplexed connection. Startup calls this
    /// before binding the listener; an unreachable Redis is fatal.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, AppError> {
        let client = Client::open(settings.url().as_str())?;
        let connection = client.get_multiplexed_async_connection().await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
        })
    }

    pub async fn health_check(&self) -> Result<bool, AppError> {
        let mut conn = self.connection.write().await;
        let result: String = redis::cmd("PING").query_async(&mut *conn).await?;

        Ok(result == "PONG")
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn.get(key).await?;

        Ok(value)
    }

    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let mut conn = self.connection.write().await;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.connection.write().await;
        let deleted: i64 = conn.del(key).await?;

        Ok(deleted > 0)
    }

    /// Key for a user's pending password recovery code.
    pub fn recovery_key(email: &str) -> String {
        format!("recovery:{}", email)
    }
}

#[async_trait]
impl RevocationStore for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), AppError> {
        self.set_with_ttl(key, value, ttl_seconds).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        RedisCache::get(self, key).await
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        RedisCache::delete(self, key).await?;
        Ok(())
    }
}
