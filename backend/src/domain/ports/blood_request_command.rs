//! Driving port for blood request lifecycle mutations.
//!
//! Inbound adapters submit requests and drive them through
//! `pending -> approved | rejected` and `approved -> fulfilled`. Every
//! transition is validated against the current persisted status, so a
//! rejected call leaves the request untouched.

use async_trait::async_trait;

use crate::domain::{BloodRequest, BloodRequestSubmission, Error, RequestId, Session};

/// Driving port for request submission and lifecycle steps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestCommand: Send + Sync {
    /// Validate and store a new `pending` request created by the session's
    /// user.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` listing every offending field, including
    /// `createdBy` when the session user cannot be resolved.
    async fn submit(
        &self,
        session: &Session,
        submission: BloodRequestSubmission,
    ) -> Result<BloodRequest, Error>;

    /// `pending -> approved`.
    ///
    /// # Errors
    ///
    /// `forbidden` for non-operators, `not_found` for unknown ids, and
    /// `invalid_transition` (with the current status) otherwise.
    async fn approve(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error>;

    /// `pending -> rejected`. Fails like [`BloodRequestCommand::approve`].
    async fn reject(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error>;

    /// `approved -> fulfilled`. Fails like [`BloodRequestCommand::approve`].
    async fn fulfil(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error>;
}
