//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, INVALIDATION_HOLD_SECONDS};
use crate::domain::entities::RedirectTarget;
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, ExistenceCheck, SetExpiry, SetOptions, Value, aio::ConnectionManager,
};
use tracing::{debug, info, warn};

/// Value written by [`RedisCache::invalidate`]. Never valid JSON for a target.
const TOMBSTONE: &str = "-";

/// Redis cache for redirect lookups.
///
/// Targets are stored as JSON under `shortlink:<code>` with `SET ... NX`, so a
/// fill never overwrites the tombstone an invalidation leaves behind. Read
/// errors are surfaced so the resolver can log them and fall back to the
/// database; write errors are logged and swallowed.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "shortlink:".to_string(),
        })
    }

    fn build_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }

    fn effective_ttl(&self, ttl_seconds: Option<u64>) -> u64 {
        ttl_seconds
            .map(|ttl| ttl.clamp(1, self.default_ttl))
            .unwrap_or(self.default_ttl)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_target(&self, short_code: &str) -> CacheResult<Option<RedirectTarget>> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        let raw = conn
            .get::<_, Option<String>>(&key)
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {}: {}", key, e)))?;

        match raw {
            Some(json) if json != TOMBSTONE => serde_json::from_str(&json).map(Some).map_err(|e| {
                CacheError::OperationError(format!("Corrupt cache entry {}: {}", key, e))
            }),
            _ => Ok(None),
        }
    }

    async fn set_target(
        &self,
        short_code: &str,
        target: &RedirectTarget,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<bool> {
        let key = self.build_key(short_code);
        let ttl = self.effective_ttl(ttl_seconds);

        let json = serde_json::to_string(target)
            .map_err(|e| CacheError::OperationError(format!("Serialize {}: {}", key, e)))?;

        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl));

        let mut conn = self.client.clone();
        match conn.set_options::<_, _, Value>(&key, json, options).await {
            Ok(Value::Nil) => {
                debug!(code = short_code, "Cache fill skipped, key occupied");
                Ok(false)
            }
            Ok(_) => {
                debug!(code = short_code, ttl, "Cache SET");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, code = short_code, "Redis SET failed");
                Ok(false)
            }
        }
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, TOMBSTONE, INVALIDATION_HOLD_SECONDS)
            .await
            .map(|()| debug!(code = short_code, "Cache INVALIDATE"))
            .map_err(|e| CacheError::OperationError(format!("SET {}: {}", key, e)))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
