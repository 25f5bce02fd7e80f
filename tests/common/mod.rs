#![allow(dead_code)]

use axum::{Router, middleware, routing::get};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

use shortlink_service::api::handlers::{health_handler, redirect_handler};
use shortlink_service::api::middleware::auth;
use shortlink_service::api::routes::protected_routes;
use shortlink_service::application::services::auth_service::hash_token;
use shortlink_service::domain::click_event::ClickEvent;
use shortlink_service::domain::repositories::TokenRepository;
use shortlink_service::infrastructure::cache::NullCache;
use shortlink_service::infrastructure::persistence::PgTokenRepository;
use shortlink_service::state::AppState;

pub const TEST_SECRET: &str = "test-signing-secret";

/// State over `pool` with caching disabled. The receiver stands in for the
/// click worker.
pub fn create_test_state(pool: PgPool) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let state = AppState::new(
        Arc::new(pool),
        tx,
        Arc::new(NullCache::new()),
        TEST_SECRET.to_string(),
    );
    (state, rx)
}

/// The application routes without rate limiting, which needs a peer address.
pub fn test_router(state: AppState) -> Router {
    let api = protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .merge(api)
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Issues a token for `account` and returns the raw bearer value.
pub async fn create_test_token(pool: &PgPool, account: &str) -> String {
    let raw = format!("token-for-{account}");
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));
    repo.create_token(account, account, &hash_token(TEST_SECRET, &raw))
        .await
        .unwrap();
    raw
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Inserts a link directly, bypassing the registry. Returns its id.
pub async fn create_test_link(pool: &PgPool, code: &str, url: &str, owner: &str) -> i64 {
    insert_link(pool, code, url, owner, true, None).await
}

pub async fn create_inactive_link(pool: &PgPool, code: &str, url: &str, owner: &str) -> i64 {
    insert_link(pool, code, url, owner, false, None).await
}

pub async fn create_expired_link(pool: &PgPool, code: &str, url: &str, owner: &str) -> i64 {
    let past = Utc::now() - chrono::Duration::hours(1);
    insert_link(pool, code, url, owner, true, Some(past)).await
}

async fn insert_link(
    pool: &PgPool,
    code: &str,
    url: &str,
    owner: &str,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO short_links (short_code, destination_url, owner, is_active, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(code)
    .bind(url)
    .bind(owner)
    .bind(is_active)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn click_count_by_id(pool: &PgPool, id: i64) -> Option<i64> {
    sqlx::query_scalar("SELECT click_count FROM short_links WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

pub async fn click_count(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar("SELECT click_count FROM short_links WHERE short_code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}
