//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AuthService, LinkService, RedirectService};
use crate::domain::click_event::ClickEvent;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::persistence::{PgLinkRepository, PgTokenRepository};

/// Services and channels shared across requests.
///
/// Cloning is cheap: every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<PgLinkRepository>>,
    pub redirect_service: Arc<RedirectService<PgLinkRepository>>,
    pub auth_service: Arc<AuthService<PgTokenRepository>>,
    pub cache: Arc<dyn CacheService>,
    /// Producer side of the click queue, kept for the health check.
    pub click_sender: mpsc::Sender<ClickEvent>,
}

impl AppState {
    /// Wires repositories and services over one connection pool.
    pub fn new(
        pool: Arc<PgPool>,
        click_sender: mpsc::Sender<ClickEvent>,
        cache: Arc<dyn CacheService>,
        token_signing_secret: String,
    ) -> Self {
        let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
        let token_repository = Arc::new(PgTokenRepository::new(pool));

        Self {
            link_service: Arc::new(LinkService::new(link_repository.clone(), cache.clone())),
            redirect_service: Arc::new(RedirectService::new(
                link_repository,
                cache.clone(),
                click_sender.clone(),
            )),
            auth_service: Arc::new(AuthService::new(token_repository, token_signing_secret)),
            cache,
            click_sender,
        }
    }
}
