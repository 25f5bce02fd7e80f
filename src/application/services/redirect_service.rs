//! Redirect resolution and click dispatch.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::RedirectTarget;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::is_well_formed_code;

/// Resolves short codes to destinations for the public redirect path.
///
/// Lookups go through the cache first and fall back to the database on a miss
/// or cache error. A hit is re-checked against its expiry, because a cached
/// target can outlive the link's validity window.
///
/// Cache fills run in the background after the database read. They cannot
/// resurrect a link an owner just changed, because invalidation leaves a
/// tombstone that fills do not overwrite (see [`CacheService`]).
///
/// Every successful resolution emits exactly one [`ClickEvent`]. Emission
/// never blocks the caller: when the queue is full the send is moved to a
/// background task instead of being dropped.
pub struct RedirectService<L: LinkRepository> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    click_sender: mpsc::Sender<ClickEvent>,
}

impl<L: LinkRepository> RedirectService<L> {
    pub fn new(
        link_repository: Arc<L>,
        cache: Arc<dyn CacheService>,
        click_sender: mpsc::Sender<ClickEvent>,
    ) -> Self {
        Self {
            link_repository,
            cache,
            click_sender,
        }
    }

    /// Returns the destination URL for `code` and queues a click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when the code is unknown, inactive,
    /// expired or outside the short code charset. The cases are
    /// indistinguishable to the caller.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if !is_well_formed_code(code) {
            return Err(AppError::not_found());
        }

        let target = self.lookup(code).await?.ok_or_else(AppError::not_found)?;

        // Rows written before destinations were screened for control
        // characters cannot be sent as a Location header.
        if target.destination_url.chars().any(char::is_control) {
            error!(link_id = target.link_id, code, "Stored destination is not a valid Location");
            return Err(AppError::not_found());
        }

        self.dispatch_click(ClickEvent::new(target.link_id, code));

        Ok(target.destination_url)
    }

    async fn lookup(&self, code: &str) -> Result<Option<RedirectTarget>, AppError> {
        let now = Utc::now();

        match self.cache.get_target(code).await {
            Ok(Some(target)) => {
                debug!(code, "Cache HIT");
                if target.is_expired_at(now) {
                    return Ok(None);
                }
                return Ok(Some(target));
            }
            Ok(None) => debug!(code, "Cache MISS"),
            Err(e) => error!(error = %e, code, "Cache error, falling back to database"),
        }

        let Some(link) = self.link_repository.find_by_code(code).await? else {
            return Ok(None);
        };

        if !link.is_resolvable_at(now) {
            return Ok(None);
        }

        let target = link.redirect_target();
        let ttl = target
            .expires_at
            .map(|e| (e - now).num_seconds().max(1) as u64);

        let cache = self.cache.clone();
        let key = code.to_string();
        let cached = target.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.set_target(&key, &cached, ttl).await {
                warn!(error = %e, code = %key, "Failed to cache redirect target");
            }
        });

        Ok(Some(target))
    }

    /// Hands an event to the click worker without waiting for capacity.
    pub fn dispatch_click(&self, event: ClickEvent) {
        match self.click_sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                counter!("clicks_deferred_total").increment(1);
                warn!(link_id = event.link_id, "Click queue full, deferring send");

                let sender = self.click_sender.clone();
                tokio::spawn(async move {
                    if let Err(e) = sender.send(event).await {
                        error!(link_id = e.0.link_id, "Click worker gone, click lost");
                        counter!("clicks_failed_total").increment(1);
                    }
                });
            }
            Err(TrySendError::Closed(event)) => {
                error!(link_id = event.link_id, "Click worker gone, click lost");
                counter!("clicks_failed_total").increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ShortLink;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{CacheError, CacheResult, NullCache};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    enum Slot {
        Target(RedirectTarget),
        Tombstone,
    }

    /// In-process cache with the same fill/invalidate rules as Redis.
    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, Slot>>,
        failing: bool,
    }

    #[async_trait]
    impl CacheService for MemoryCache {
        async fn get_target(&self, short_code: &str) -> CacheResult<Option<RedirectTarget>> {
            if self.failing {
                return Err(CacheError::ConnectionError("down".to_string()));
            }
            match self.entries.lock().unwrap().get(short_code) {
                Some(Slot::Target(target)) => Ok(Some(target.clone())),
                _ => Ok(None),
            }
        }

        async fn set_target(
            &self,
            short_code: &str,
            target: &RedirectTarget,
            _ttl_seconds: Option<u64>,
        ) -> CacheResult<bool> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(short_code) {
                return Ok(false);
            }
            entries.insert(short_code.to_string(), Slot::Target(target.clone()));
            Ok(true)
        }

        async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(short_code.to_string(), Slot::Tombstone);
            Ok(())
        }

        async fn health_check(&self) -> bool {
            !self.failing
        }
    }

    fn link(code: &str) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            id: 7,
            short_code: code.to_string(),
            destination_url: "https://example.com/x".to_string(),
            title: None,
            description: None,
            owner: "marketing".to_string(),
            created_at: now,
            updated_at: now,
            expires_at: None,
            click_count: 0,
            is_active: true,
        }
    }

    fn service_with(
        repo: MockLinkRepository,
        cache: Arc<dyn CacheService>,
        capacity: usize,
    ) -> (RedirectService<MockLinkRepository>, mpsc::Receiver<ClickEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (RedirectService::new(Arc::new(repo), cache, tx), rx)
    }

    #[tokio::test]
    async fn test_resolve_active_link_emits_click() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .withf(|code| code == "promo1")
            .times(1)
            .returning(|code| Ok(Some(link(code))));

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        let url = service.resolve("promo1").await.unwrap();

        assert_eq!(url, "https://example.com/x");
        assert_eq!(rx.recv().await, Some(ClickEvent::new(7, "promo1")));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        let err = service.resolve("nope").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_inactive_link_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(ShortLink {
                is_active: false,
                ..link(code)
            }))
        });

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        assert!(matches!(
            service.resolve("promo1").await.unwrap_err(),
            AppError::NotFound
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_expired_link_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(ShortLink {
                expires_at: Some(Utc::now() - Duration::seconds(1)),
                ..link(code)
            }))
        });

        let (service, _rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        assert!(matches!(
            service.resolve("promo1").await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_database() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(0);

        let cache = Arc::new(MemoryCache::default());
        cache
            .set_target("promo1", &link("promo1").redirect_target(), None)
            .await
            .unwrap();

        let (service, mut rx) = service_with(repo, cache, 8);

        assert_eq!(service.resolve("promo1").await.unwrap(), "https://example.com/x");
        assert_eq!(rx.recv().await.unwrap().link_id, 7);
    }

    #[tokio::test]
    async fn test_expired_cache_hit_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(0);

        let cache = Arc::new(MemoryCache::default());
        let stale = ShortLink {
            expires_at: Some(Utc::now() - Duration::seconds(5)),
            ..link("promo1")
        };
        cache
            .set_target("promo1", &stale.redirect_target(), None)
            .await
            .unwrap();

        let (service, _rx) = service_with(repo, cache, 8);

        assert!(matches!(
            service.resolve("promo1").await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_cache_error_falls_back_to_database() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(link(code))));

        let cache = Arc::new(MemoryCache {
            failing: true,
            ..Default::default()
        });

        let (service, _rx) = service_with(repo, cache, 8);

        assert!(service.resolve("promo1").await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_codes_skip_lookup() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(0);

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        for code in ["dot.ted", "a\0b", "promo1\n", "a/b", ""] {
            assert!(
                matches!(service.resolve(code).await.unwrap_err(), AppError::NotFound),
                "resolved: {code:?}"
            );
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_destination_unusable_as_header_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(ShortLink {
                destination_url: "https://example.com/a\nb".to_string(),
                ..link(code)
            }))
        });

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 8);

        assert!(matches!(
            service.resolve("legacy").await.unwrap_err(),
            AppError::NotFound
        ));
        assert!(rx.try_recv().is_err(), "no click for an unusable destination");
    }

    #[tokio::test]
    async fn test_invalidation_wins_over_pending_fill() {
        let active = Arc::new(AtomicBool::new(true));

        let mut repo = MockLinkRepository::new();
        let flag = active.clone();
        repo.expect_find_by_code().times(2).returning(move |code| {
            Ok(Some(ShortLink {
                is_active: flag.load(Ordering::SeqCst),
                ..link(code)
            }))
        });

        let cache = Arc::new(MemoryCache::default());
        let (service, _rx) = service_with(repo, cache.clone(), 8);

        // The fill from this resolve is spawned but has not run yet.
        service.resolve("promo1").await.unwrap();

        // Owner deactivates the link and invalidates before the fill lands.
        active.store(false, Ordering::SeqCst);
        cache.invalidate("promo1").await.unwrap();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(cache.get_target("promo1").await.unwrap().is_none());
        assert!(matches!(
            service.resolve("promo1").await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_fill_after_miss_populates_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(link(code))));

        let cache = Arc::new(MemoryCache::default());
        let (service, _rx) = service_with(repo, cache.clone(), 8);

        service.resolve("promo1").await.unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(service.resolve("promo1").await.unwrap(), "https://example.com/x");
    }

    #[tokio::test]
    async fn test_full_queue_defers_instead_of_dropping() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(link(code))));

        let (service, mut rx) = service_with(repo, Arc::new(NullCache::new()), 1);

        service.resolve("promo1").await.unwrap();
        service.resolve("promo1").await.unwrap();
        service.resolve("promo1").await.unwrap();

        for _ in 0..3 {
            assert_eq!(rx.recv().await.unwrap().short_code, "promo1");
        }
    }
}
