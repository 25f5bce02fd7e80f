//! PostgreSQL implementation of click accounting.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// PostgreSQL click counter.
///
/// The increment is a single `UPDATE ... SET click_count = click_count + 1`,
/// so the row lock taken by PostgreSQL serialises concurrent clicks.
/// `updated_at` is left alone: it tracks owner edits, not traffic.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_click(&self, link_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
