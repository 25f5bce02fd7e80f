//! Application layer services implementing business logic.
//!
//! Services validate input, coordinate repository calls and keep the redirect
//! cache consistent with the registry. HTTP handlers and the admin CLI are
//! their only callers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Owner-scoped link registry
//! - [`services::redirect_service::RedirectService`] - Code resolution and click dispatch
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
