mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tower::ServiceExt;

use shortlink_service::domain::click_event::ClickEvent;
use shortlink_service::domain::click_worker::{ClickWorkerSettings, run_click_worker};
use shortlink_service::infrastructure::cache::NullCache;
use shortlink_service::infrastructure::persistence::PgClickRepository;
use shortlink_service::state::AppState;

fn make_server(pool: PgPool) -> (TestServer, mpsc::Receiver<ClickEvent>) {
    let (state, rx) = common::create_test_state(pool);
    (TestServer::new(common::test_router(state)).unwrap(), rx)
}

#[sqlx::test]
async fn test_redirect_success(pool: PgPool) {
    common::create_test_link(&pool, "redirect1", "https://example.com/target", "marketing").await;

    let (server, _rx) = make_server(pool);
    let response = server.get("/redirect1").await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[sqlx::test]
async fn test_redirect_preserves_destination_exactly(pool: PgPool) {
    let url = "https://example.com/path?utm_source=mail&x=%20y#frag";
    common::create_test_link(&pool, "exact", url, "marketing").await;

    let (server, _rx) = make_server(pool);

    assert_eq!(server.get("/exact").await.header("location"), url);
}

#[sqlx::test]
async fn test_redirect_emits_click_event(pool: PgPool) {
    let id = common::create_test_link(&pool, "clicked", "https://example.com", "marketing").await;

    let (server, mut rx) = make_server(pool);
    server.get("/clicked").await;

    let event = rx.try_recv().unwrap();
    assert_eq!(event, ClickEvent::new(id, "clicked"));
}

#[sqlx::test]
async fn test_unresolvable_codes_are_indistinguishable(pool: PgPool) {
    common::create_inactive_link(&pool, "paused", "https://example.com", "marketing").await;
    common::create_expired_link(&pool, "old", "https://example.com", "marketing").await;

    let (server, mut rx) = make_server(pool);

    let missing = server.get("/nonexistent").await;
    let inactive = server.get("/paused").await;
    let expired = server.get("/old").await;

    for response in [&missing, &inactive, &expired] {
        response.assert_status_not_found();
        assert!(response.maybe_header("location").is_none());
    }

    let body = missing.text();
    assert_eq!(inactive.text(), body);
    assert_eq!(expired.text(), body);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "NotFound");
    assert_eq!(json["details"], serde_json::json!({}));

    assert!(rx.try_recv().is_err(), "no click for unresolved codes");
}

#[sqlx::test]
async fn test_codes_outside_charset_are_not_found(pool: PgPool) {
    common::create_test_link(&pool, "dot", "https://example.com", "marketing").await;

    let (server, mut rx) = make_server(pool);

    let baseline = server.get("/nonexistent").await.text();

    for path in ["/a%00b", "/dot.ted", "/dot%0A", "/%F0%9F%98%80"] {
        let response = server.get(path).await;
        response.assert_status_not_found();
        assert_eq!(response.text(), baseline, "path {path}");
    }

    assert!(rx.try_recv().is_err());
}

#[sqlx::test]
async fn test_stored_destination_with_newline_is_not_found(pool: PgPool) {
    // Written directly, bypassing the registry's URL checks.
    common::create_test_link(&pool, "legacy", "https://example.com/a\nb", "marketing").await;

    let (server, mut rx) = make_server(pool);

    let response = server.get("/legacy").await;

    response.assert_status_not_found();
    assert!(response.maybe_header("location").is_none());
    assert!(rx.try_recv().is_err(), "no click for an unusable destination");
}

#[sqlx::test]
async fn test_redirect_does_not_require_auth(pool: PgPool) {
    common::create_test_link(&pool, "public", "https://example.com", "marketing").await;

    let (server, _rx) = make_server(pool);

    server
        .get("/public")
        .await
        .assert_status(StatusCode::FOUND);
}

#[sqlx::test]
async fn test_concurrent_redirects_count_every_click(pool: PgPool) {
    const N: usize = 64;

    common::create_test_link(&pool, "promo1", "https://example.com/x", "marketing").await;

    let shared = Arc::new(pool.clone());
    // Smaller than N so some sends take the deferred path.
    let (tx, rx) = mpsc::channel(8);
    let worker = tokio::spawn(run_click_worker(
        rx,
        Arc::new(PgClickRepository::new(shared.clone())),
        ClickWorkerSettings {
            concurrency: 8,
            max_retries: 3,
        },
    ));

    let state = AppState::new(
        shared,
        tx,
        Arc::new(NullCache::new()),
        common::TEST_SECRET.to_string(),
    );
    let app = common::test_router(state);

    let mut requests = JoinSet::new();
    for _ in 0..N {
        let app = app.clone();
        requests.spawn(async move {
            app.oneshot(Request::get("/promo1").body(Body::empty()).unwrap())
                .await
                .unwrap()
                .status()
        });
    }

    while let Some(status) = requests.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::FOUND);
    }

    // Dropping the last sender lets the worker drain and stop.
    drop(app);
    worker.await.unwrap();

    assert_eq!(common::click_count(&pool, "promo1").await, N as i64);
}
