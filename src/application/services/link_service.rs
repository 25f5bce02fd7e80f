//! Link registry: create, list, update and delete short links.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::{Caller, NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{generate_code, validate_short_code};
use crate::utils::url_validator::validate_destination_url;

/// Attempts at finding a free generated code before giving up.
const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Input for [`LinkService::create_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    /// Caller-chosen code; a random one is generated when `None`.
    pub short_code: Option<String>,
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owner-scoped CRUD over short links.
///
/// Every operation acts only on rows owned by the caller; links of other
/// owners are reported as [`AppError::NotFound`]. After a mutation the
/// redirect cache entry for the code is invalidated.
pub struct LinkService<L: LinkRepository> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
}

impl<L: LinkRepository> LinkService<L> {
    pub fn new(link_repository: Arc<L>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            link_repository,
            cache,
        }
    }

    /// Creates a short link owned by `caller`.
    ///
    /// Validation runs before any write: the code first, then the URL.
    /// The datastore's unique constraint decides code availability, so two
    /// concurrent creates of the same code cannot both succeed.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidCode`] - empty, reserved or out-of-charset code
    /// - [`AppError::InvalidUrl`] - destination is not an absolute http(s) URL
    /// - [`AppError::CodeTaken`] - any row (any owner, any state) uses the code
    pub async fn create_link(
        &self,
        caller: &Caller,
        input: CreateLink,
    ) -> Result<ShortLink, AppError> {
        if let Some(code) = &input.short_code {
            validate_short_code(code)?;
        }
        validate_url(&input.destination_url)?;

        let link = match input.short_code {
            Some(short_code) => {
                self.link_repository
                    .create(NewShortLink {
                        short_code,
                        destination_url: input.destination_url,
                        title: input.title,
                        description: input.description,
                        owner: caller.account.clone(),
                        expires_at: input.expires_at,
                    })
                    .await?
            }
            None => self.create_with_generated_code(caller, input).await?,
        };

        info!(
            link_id = link.id,
            code = %link.short_code,
            owner = %link.owner,
            "Short link created"
        );

        Ok(link)
    }

    /// Lists the caller's links, newest first.
    pub async fn list_links(&self, caller: &Caller) -> Result<Vec<ShortLink>, AppError> {
        self.link_repository.list_by_owner(&caller.account).await
    }

    /// Applies a partial update to one of the caller's links.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] - a new destination was given and is invalid
    /// - [`AppError::NotFound`] - no link with `id` belongs to the caller
    pub async fn update_link(
        &self,
        caller: &Caller,
        id: i64,
        patch: ShortLinkPatch,
    ) -> Result<ShortLink, AppError> {
        if let Some(url) = &patch.destination_url {
            validate_url(url)?;
        }

        let link = self
            .link_repository
            .update(id, &caller.account, patch)
            .await?
            .ok_or_else(AppError::not_found)?;

        self.invalidate_cache(&link.short_code).await;

        info!(link_id = link.id, code = %link.short_code, "Short link updated");

        Ok(link)
    }

    /// Permanently deletes one of the caller's links. The code becomes free.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link with `id` belongs to the caller.
    pub async fn delete_link(&self, caller: &Caller, id: i64) -> Result<(), AppError> {
        let link = self
            .link_repository
            .delete(id, &caller.account)
            .await?
            .ok_or_else(AppError::not_found)?;

        self.invalidate_cache(&link.short_code).await;

        info!(link_id = link.id, code = %link.short_code, "Short link deleted");

        Ok(())
    }

    /// Checks datastore connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.link_repository.ping().await
    }

    /// Inserts with random codes until one is free.
    async fn create_with_generated_code(
        &self,
        caller: &Caller,
        input: CreateLink,
    ) -> Result<ShortLink, AppError> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let new_link = NewShortLink {
                short_code: generate_code()?,
                destination_url: input.destination_url.clone(),
                title: input.title.clone(),
                description: input.description.clone(),
                owner: caller.account.clone(),
                expires_at: input.expires_at,
            };

            match self.link_repository.create(new_link).await {
                Err(AppError::CodeTaken { code }) => {
                    warn!(?code, "Generated short code collided, retrying");
                }
                result => return result,
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    async fn invalidate_cache(&self, short_code: &str) {
        if let Err(e) = self.cache.invalidate(short_code).await {
            warn!(error = %e, code = short_code, "Failed to invalidate cache");
        }
    }
}

fn validate_url(url: &str) -> Result<(), AppError> {
    validate_destination_url(url).map_err(|e| {
        AppError::invalid_url(
            "Invalid destination URL",
            json!({ "destination_url": url, "reason": e.to_string() }),
        )
    })
}
