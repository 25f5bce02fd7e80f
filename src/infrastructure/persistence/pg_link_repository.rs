//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_code;

const LINK_COLUMNS: &str = "id, short_code, destination_url, title, description, owner, \
     created_at, updated_at, expires_at, click_count, is_active";

#[derive(sqlx::FromRow)]
struct ShortLinkRow {
    id: i64,
    short_code: String,
    destination_url: String,
    title: Option<String>,
    description: Option<String>,
    owner: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    click_count: i64,
    is_active: bool,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        ShortLink {
            id: r.id,
            short_code: r.short_code,
            destination_url: r.destination_url,
            title: r.title,
            description: r.description,
            owner: r.owner,
            created_at: r.created_at,
            updated_at: r.updated_at,
            expires_at: r.expires_at,
            click_count: r.click_count,
            is_active: r.is_active,
        }
    }
}

/// PostgreSQL repository for the link registry.
///
/// Short code uniqueness is enforced by the `short_links_short_code_key`
/// constraint, never by a preceding SELECT.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            r#"
            INSERT INTO short_links (short_code, destination_url, title, description, owner, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(&new_link.short_code)
            .bind(&new_link.destination_url)
            .bind(&new_link.title)
            .bind(&new_link.description)
            .bind(&new_link.owner)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on_code(&e) {
                    AppError::code_taken(&new_link.short_code)
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM short_links WHERE short_code = $1");

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links
            WHERE owner = $1
            ORDER BY created_at DESC, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(owner)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        id: i64,
        owner: &str,
        patch: ShortLinkPatch,
    ) -> Result<Option<ShortLink>, AppError> {
        // Nullable columns take a "present" flag so that an explicit null clears them.
        let sql = format!(
            r#"
            UPDATE short_links SET
                is_active       = COALESCE($3, is_active),
                destination_url = COALESCE($4, destination_url),
                title           = CASE WHEN $5 THEN $6 ELSE title END,
                description     = CASE WHEN $7 THEN $8 ELSE description END,
                expires_at      = CASE WHEN $9 THEN $10 ELSE expires_at END,
                updated_at      = NOW()
            WHERE id = $1 AND owner = $2
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.is_active)
            .bind(patch.destination_url)
            .bind(patch.title.is_some())
            .bind(patch.title.flatten())
            .bind(patch.description.is_some())
            .bind(patch.description.flatten())
            .bind(patch.expires_at.is_some())
            .bind(patch.expires_at.flatten())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: i64, owner: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            "DELETE FROM short_links WHERE id = $1 AND owner = $2 RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
