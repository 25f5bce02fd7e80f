//! Read-through cache for the redirect path.
//!
//! [`CacheService`] is keyed by short code and stores [`RedirectTarget`]s.
//! [`RedisCache`] backs it in production; [`NullCache`] is used when Redis is
//! not configured or unreachable at startup.
//!
//! [`RedirectTarget`]: crate::domain::entities::RedirectTarget

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, INVALIDATION_HOLD_SECONDS};
