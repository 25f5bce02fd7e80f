//! Repository trait for click accounting.

use crate::error::AppError;
use async_trait::async_trait;

/// Atomic click counter storage.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Increments `click_count` of a link by exactly one.
    ///
    /// The increment happens inside the datastore, so concurrent calls for the
    /// same link never lose updates.
    ///
    /// Returns `Ok(false)` if the link no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn record_click(&self, link_id: i64) -> Result<bool, AppError>;
}
