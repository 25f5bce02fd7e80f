//! Authenticated caller identity.

/// The account on whose behalf a management request runs.
///
/// Produced by [`crate::application::services::AuthService::authenticate`] and
/// placed in request extensions by the auth middleware. Registry operations
/// scope every read and write to `account`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account: String,
}

impl Caller {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}
