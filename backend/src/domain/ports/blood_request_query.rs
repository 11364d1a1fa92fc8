//! Driving port for reading blood requests.

use async_trait::async_trait;

use crate::domain::{BloodRequest, Error, RequestId, RequestStatus, UserId};

/// Driving port for reading blood requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestQuery: Send + Sync {
    async fn get(&self, id: &RequestId) -> Result<BloodRequest, Error>;

    /// All requests, optionally restricted to one status, oldest first.
    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<BloodRequest>, Error>;

    /// Requests created by `user_id`, oldest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<BloodRequest>, Error>;
}
