//! Handler for the public short link redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its destination.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Responses
///
/// - **302 Found** with `Location: <destination>` for an active, unexpired link
/// - **404 Not Found** for unknown, deactivated or expired codes, all with the
///   same body
///
/// A click event is queued before the response is written; the response
/// never waits for it to be counted.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let destination = state.redirect_service.resolve(&code).await?;

    let location = HeaderValue::try_from(destination).map_err(|e| {
        AppError::internal(
            "Destination cannot be sent as a Location header",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
