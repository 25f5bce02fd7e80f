//! DTOs for the link registry endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{ShortLink, ShortLinkPatch};

/// Request body for `POST /links`.
///
/// `short_code` and `destination_url` are checked by the registry itself so
/// that their failures surface as `InvalidCode` / `InvalidUrl` rather than a
/// generic validation error. `click_count` has no request field.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Omit to get a generated 12-character code.
    pub short_code: Option<String>,

    pub destination_url: String,

    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        Self {
            short_code: req.short_code,
            destination_url: req.destination_url,
            title: req.title,
            description: req.description,
            expires_at: req.expires_at,
        }
    }
}

/// Request body for `PATCH /links/{id}`.
///
/// For the nullable fields an absent key leaves the value unchanged, `null`
/// clears it and a value sets it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    pub is_active: Option<bool>,

    pub destination_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 255))]
    pub title: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 2000))]
    pub description: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateLinkRequest> for ShortLinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            is_active: req.is_active,
            destination_url: req.destination_url,
            title: req.title,
            description: req.description,
            expires_at: req.expires_at,
        }
    }
}

/// A link as returned to its owner. The owner itself is not echoed.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShortLink> for LinkResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code,
            destination_url: link.destination_url,
            title: link.title,
            description: link.description,
            expires_at: link.expires_at,
            click_count: link.click_count,
            is_active: link.is_active,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}
