//! Cache service trait and error types.

use async_trait::async_trait;

use crate::domain::entities::RedirectTarget;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// How long an invalidated key refuses fills. Longer than any
/// database read that can precede a fill.
pub const INVALIDATION_HOLD_SECONDS: u64 = 30;

/// Read-through cache for redirect targets keyed by short code.
///
/// Only resolvable links are stored. Entries must be invalidated whenever the
/// link is updated or deleted; expiry is re-checked by the caller on every hit.
///
/// A fill races with invalidation: the resolver reads the row, an owner edit
/// commits and invalidates, then the fill lands. Implementations that keep
/// state therefore make [`invalidate`](Self::invalidate) leave a short-lived
/// tombstone and make [`set_target`](Self::set_target) write only when the key
/// holds neither an entry nor a tombstone.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the redirect target for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Implementations may return errors; callers fall back to the database.
    async fn get_target(&self, short_code: &str) -> CacheResult<Option<RedirectTarget>>;

    /// Stores a redirect target unless the key is occupied.
    ///
    /// Returns `Ok(false)` when an entry or tombstone already holds the key.
    /// `ttl_seconds` caps the implementation's default TTL; it is used to keep
    /// entries from outliving the link's `expires_at`.
    async fn set_target(
        &self,
        short_code: &str,
        target: &RedirectTarget,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<bool>;

    /// Replaces a cached target with a tombstone that blocks fills for
    /// [`INVALIDATION_HOLD_SECONDS`]. Lookups treat the tombstone as a miss.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
