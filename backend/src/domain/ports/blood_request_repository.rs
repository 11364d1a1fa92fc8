//! Port for blood request persistence.
//!
//! Requests are inserted once and then only transitioned. A transition is a
//! compare-and-set keyed on `(id, status = from)`; when it does not apply,
//! the adapter reports why instead of the caller re-reading.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BloodRequest, BloodType, RequestId, RequestStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by blood request repository adapters.
    pub enum BloodRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message } =>
            "blood request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } =>
            "blood request repository query failed: {message}",
        /// A request with this id already exists.
        Duplicate { id } =>
            "blood request {id} already exists",
    }
}

/// Outcome of a conditional status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(BloodRequest),
    /// The request exists but is not in the expected status.
    Conflict { current: RequestStatus },
    NotFound,
}

/// Selection criteria for listing requests. Empty criteria select all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub blood_groups: Option<Vec<BloodType>>,
    pub created_by: Option<UserId>,
}

impl RequestFilter {
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_blood_groups(mut self, groups: impl IntoIterator<Item = BloodType>) -> Self {
        self.blood_groups = Some(groups.into_iter().collect());
        self
    }

    #[must_use]
    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// In-process evaluation, used by stores without a query planner.
    pub fn matches(&self, request: &BloodRequest) -> bool {
        self.status.is_none_or(|status| request.status == status)
            && self
                .blood_groups
                .as_ref()
                .is_none_or(|groups| groups.contains(&request.blood_group))
            && self
                .created_by
                .as_ref()
                .is_none_or(|user| request.created_by == *user)
    }
}

/// Driven port persisting blood requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestRepository: Send + Sync {
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError>;

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError>;

    /// Requests matching `filter`, oldest first.
    async fn list(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Move a request from `from` to `to` if and only if it is currently in
    /// `from`.
    async fn transition(
        &self,
        id: &RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, BloodRequestRepositoryError>;
}
