//! Management API route configuration.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, list_links_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

/// Link registry routes. The caller wraps them in Bearer authentication.
///
/// # Endpoints
///
/// - `POST   /links`       - Create a link
/// - `GET    /links`       - List the caller's links, newest first
/// - `PATCH  /links/{id}`  - Partially update a link
/// - `DELETE /links/{id}`  - Delete a link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route(
            "/links/{id}",
            patch(update_link_handler).delete(delete_link_handler),
        )
}
