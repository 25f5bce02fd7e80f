//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies are deserialized with Serde and checked with `validator`
//! before reaching a service.

pub mod health;
pub mod link;
