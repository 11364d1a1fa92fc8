//! Port for hospital lookups.

use async_trait::async_trait;

use crate::domain::{Hospital, HospitalId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by hospital repository adapters.
    pub enum HospitalRepositoryError {
        /// Repository connection could not be established.
        Connection { message } =>
            "hospital repository connection failed: {message}",
        /// Query failed during execution.
        Query { message } =>
            "hospital repository query failed: {message}",
    }
}

/// Driven port for hospital lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HospitalRepository: Send + Sync {
    async fn find_by_id(&self, id: &HospitalId) -> Result<Option<Hospital>, HospitalRepositoryError>;
}
