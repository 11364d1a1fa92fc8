//! Port for resolving Auth identities.
//!
//! Requests record who created them. Submission fails when the session's
//! user cannot be resolved to a known identity.

use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised while consulting the identity directory.
    pub enum IdentityDirectoryError {
        /// The directory could not be reached.
        Unavailable { message } =>
            "identity directory unavailable: {message}",
    }
}

/// Driven port confirming identities issued by the Auth collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn is_known(&self, user_id: &UserId) -> Result<bool, IdentityDirectoryError>;
}

/// Directory that accepts every identity the Auth collaborator presents.
///
/// Used when Auth has already authenticated the session and there is no
/// separate user table to consult.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthenticatedIdentityDirectory;

#[async_trait]
impl IdentityDirectory for AuthenticatedIdentityDirectory {
    async fn is_known(&self, _user_id: &UserId) -> Result<bool, IdentityDirectoryError> {
        Ok(true)
    }
}
