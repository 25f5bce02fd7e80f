//! Domain layer containing business entities and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click accounting event model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! The domain layer has no dependency on HTTP or SQL. Repository traits are
//! implemented in `crate::infrastructure`, business rules live in
//! [`crate::application::services`].
//!
//! # Click Processing Flow
//!
//! 1. The resolver finds an active, unexpired link
//! 2. A [`click_event::ClickEvent`] is pushed onto a bounded channel
//! 3. The redirect response is sent without waiting
//! 4. [`click_worker::run_click_worker`] increments the counter via
//!    [`repositories::ClickRepository`], retrying on failure

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
