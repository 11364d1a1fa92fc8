//! Port for donor profile lookups.

use async_trait::async_trait;

use crate::domain::{Donor, DonorId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by donor repository adapters.
    pub enum DonorRepositoryError {
        /// Repository connection could not be established.
        Connection { message } =>
            "donor repository connection failed: {message}",
        /// Query failed during execution.
        Query { message } =>
            "donor repository query failed: {message}",
    }
}

/// Driven port for donor profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonorRepository: Send + Sync {
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError>;
}
