//! PostgreSQL repository implementations.
//!
//! Queries are built with SQLx bind parameters and mapped through private
//! `FromRow` structs, so domain entities carry no SQL types.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link registry storage
//! - [`PgClickRepository`] - Atomic click counters
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_token_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_token_repository::PgTokenRepository;
