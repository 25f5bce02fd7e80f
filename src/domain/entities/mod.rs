//! Core domain entities.
//!
//! - [`ShortLink`] - A short code → destination mapping
//! - [`Caller`] - The authenticated account behind a management request
//!
//! Creation and partial-update inputs live next to the entity they build:
//! [`NewShortLink`] and [`ShortLinkPatch`].

pub mod caller;
pub mod link;

pub use caller::Caller;
pub use link::{NewShortLink, RedirectTarget, ShortLink, ShortLinkPatch};
