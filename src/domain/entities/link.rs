//! Short link entity and its creation/update inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short code → destination mapping owned by one account.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: i64,
    pub short_code: String,
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub is_active: bool,
}

impl ShortLink {
    /// Returns true if the link has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Active and unexpired links are the only ones a redirect may follow.
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Projection used by the redirect path and its cache.
    pub fn redirect_target(&self) -> RedirectTarget {
        RedirectTarget {
            link_id: self.id,
            destination_url: self.destination_url.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Input data for persisting a new link.
///
/// The code and URL are expected to be validated already; the repository only
/// enforces uniqueness.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub short_code: String,
    pub destination_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. For nullable columns,
/// `Some(None)` clears the value and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct ShortLinkPatch {
    pub is_active: Option<bool>,
    pub destination_url: Option<String>,
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// What the resolver needs to answer `GET /{code}`.
///
/// Only resolvable links are turned into targets, so `is_active` is implied.
/// Expiry is kept because a cached target can outlive the link's validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectTarget {
    pub link_id: i64,
    pub destination_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RedirectTarget {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }
}
