//! Handlers for the owner-scoped link registry.
//!
//! Every handler runs behind [`crate::api::middleware::auth::layer`], which
//! places the authenticated [`Caller`] into request extensions.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /links`
///
/// # Request Body
///
/// ```json
/// {
///   "short_code": "promo1",
///   "destination_url": "https://example.com/x",
///   "title": "Spring promo",
///   "expires_at": "2026-12-31T23:59:59Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 with `error` set to `InvalidCode`, `InvalidUrl` or `CodeTaken`.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .create_link(&caller, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.list_links(&caller).await?;

    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /links/{id}`
///
/// # Request Body
///
/// All fields are optional. For `title`, `description` and `expires_at`,
/// `null` clears the value.
///
/// ```json
/// { "is_active": false, "expires_at": null }
/// ```
///
/// # Errors
///
/// Returns 404 if the link does not exist or belongs to another account.
/// Returns 400 `InvalidUrl` if a new destination is not an absolute http(s) URL.
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .update_link(&caller, id, payload.into())
        .await?;

    Ok(Json(link.into()))
}

/// Permanently deletes one of the caller's links. The code can be reused.
///
/// # Endpoint
///
/// `DELETE /links/{id}`
///
/// # Errors
///
/// Returns 404 if the link does not exist or belongs to another account.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;

    state.link_service.delete_link(&caller, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
