//! Blood request lifecycle service.
//!
//! Implements [`BloodRequestCommand`] and [`BloodRequestQuery`]. Transitions
//! are compare-and-set operations in the store keyed on the expected source
//! status, so two operators racing to approve and reject the same request
//! cannot both succeed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    BloodRequestCommand, BloodRequestQuery, BloodRequestRepository, BloodRequestRepositoryError,
    IdentityDirectory, IdentityDirectoryError, RequestFilter, TransitionOutcome,
};
use crate::domain::{
    BloodRequest, BloodRequestSubmission, Error, FieldViolation, RequestId, RequestStatus,
    RequestTransition, Session, UserId,
};

/// Submission, review, and listing of blood requests.
#[derive(Clone)]
pub struct RequestLifecycleService<R, D> {
    requests: Arc<R>,
    identities: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<R, D> RequestLifecycleService<R, D> {
    pub fn new(requests: Arc<R>, identities: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests,
            identities,
            clock,
        }
    }
}

impl<R, D> RequestLifecycleService<R, D>
where
    R: BloodRequestRepository,
    D: IdentityDirectory,
{
    fn map_request_error(error: BloodRequestRepositoryError) -> Error {
        match error {
            BloodRequestRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("request store unavailable: {message}"))
            }
            BloodRequestRepositoryError::Query { message } => {
                Error::internal(format!("request store error: {message}"))
            }
            BloodRequestRepositoryError::Duplicate { id } => {
                Error::internal(format!("request id collision: {id}"))
            }
        }
    }

    fn map_identity_error(error: IdentityDirectoryError) -> Error {
        match error {
            IdentityDirectoryError::Unavailable { message } => {
                Error::service_unavailable(format!("identity directory unavailable: {message}"))
            }
        }
    }

    async fn apply(
        &self,
        session: &Session,
        id: &RequestId,
        transition: RequestTransition,
    ) -> Result<BloodRequest, Error> {
        session.require_operator(&format!("{} requests", transition.verb()))?;

        let outcome = self
            .requests
            .transition(
                id,
                transition.source(),
                transition.target(),
                self.clock.utc(),
            )
            .await
            .map_err(Self::map_request_error)?;

        match outcome {
            TransitionOutcome::Applied(request) => {
                info!(
                    request_id = %id,
                    from = %transition.source(),
                    to = %transition.target(),
                    user_id = %session.user_id(),
                    "blood request transitioned"
                );
                Ok(request)
            }
            TransitionOutcome::Conflict { current } => {
                warn!(
                    request_id = %id,
                    current = %current,
                    attempted = transition.verb(),
                    "blood request transition refused"
                );
                Err(Self::invalid_transition(transition, current))
            }
            TransitionOutcome::NotFound => {
                Err(Error::not_found(format!("blood request {id} not found")))
            }
        }
    }

    fn invalid_transition(transition: RequestTransition, current: RequestStatus) -> Error {
        Error::invalid_transition(format!(
            "cannot {} a request that is {current}",
            transition.verb()
        ))
        .with_details(json!({
            "currentStatus": current,
            "requiredStatus": transition.source(),
        }))
    }
}

#[async_trait]
impl<R, D> BloodRequestCommand for RequestLifecycleService<R, D>
where
    R: BloodRequestRepository,
    D: IdentityDirectory,
{
    async fn submit(
        &self,
        session: &Session,
        submission: BloodRequestSubmission,
    ) -> Result<BloodRequest, Error> {
        let creator_known = self
            .identities
            .is_known(session.user_id())
            .await
            .map_err(Self::map_identity_error)?;

        let mut violations = match submission.validate() {
            Ok(details) if creator_known => {
                let request = BloodRequest::pending(
                    RequestId::random(),
                    details,
                    *session.user_id(),
                    self.clock.utc(),
                );
                self.requests
                    .insert(&request)
                    .await
                    .map_err(Self::map_request_error)?;
                info!(
                    request_id = %request.id,
                    blood_group = %request.blood_group,
                    urgency = request.urgency.as_str(),
                    units = request.units,
                    user_id = %session.user_id(),
                    "blood request submitted"
                );
                return Ok(request);
            }
            Ok(_) => Vec::new(),
            Err(violations) => violations,
        };
        if !creator_known {
            violations.push(FieldViolation::new(
                "createdBy",
                "unknown_user",
                "session user is not a known identity",
            ));
        }
        Err(Error::validation(violations))
    }

    async fn approve(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error> {
        self.apply(session, id, RequestTransition::Approve).await
    }

    async fn reject(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error> {
        self.apply(session, id, RequestTransition::Reject).await
    }

    async fn fulfil(&self, session: &Session, id: &RequestId) -> Result<BloodRequest, Error> {
        self.apply(session, id, RequestTransition::Fulfil).await
    }
}

#[async_trait]
impl<R, D> BloodRequestQuery for RequestLifecycleService<R, D>
where
    R: BloodRequestRepository,
    D: IdentityDirectory,
{
    async fn get(&self, id: &RequestId) -> Result<BloodRequest, Error> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(Self::map_request_error)?
            .ok_or_else(|| Error::not_found(format!("blood request {id} not found")))
    }

    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<BloodRequest>, Error> {
        let filter = RequestFilter {
            status,
            ..RequestFilter::all()
        };
        self.requests
            .list(&filter)
            .await
            .map_err(Self::map_request_error)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<BloodRequest>, Error> {
        self.requests
            .list(&RequestFilter::all().created_by(*user_id))
            .await
            .map_err(Self::map_request_error)
    }
}

#[cfg(test)]
#[path = "request_lifecycle_tests.rs"]
mod tests;
