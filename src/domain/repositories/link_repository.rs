//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the link registry.
///
/// Owner-scoped operations take the owner explicitly and behave as if rows of
/// other owners did not exist.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link with `click_count = 0` and `is_active = true`.
    ///
    /// Uniqueness of the short code is decided by the datastore in the same
    /// statement as the insert.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeTaken`] if any row already uses the code.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by short code regardless of owner or state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Lists an owner's links, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>, AppError>;

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// Returns `Ok(None)` if no link with `id` belongs to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(
        &self,
        id: i64,
        owner: &str,
        patch: ShortLinkPatch,
    ) -> Result<Option<ShortLink>, AppError>;

    /// Permanently removes a link.
    ///
    /// Returns the removed row, or `Ok(None)` if no link with `id` belongs to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64, owner: &str) -> Result<Option<ShortLink>, AppError>;

    /// Round-trips to the datastore.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the datastore is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
