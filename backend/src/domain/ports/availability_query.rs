//! Driving port for the availability signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Availability, BloodType, Error};

/// Availability signal for one blood type with the counts it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTypeAvailability {
    pub blood_type: BloodType,
    pub availability: Availability,
    pub pending: u64,
    pub total: u64,
}

/// Driving port for per-type supply estimates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityQuery: Send + Sync {
    async fn availability(&self, blood_type: BloodType) -> Result<BloodTypeAvailability, Error>;

    /// One entry per blood type, in canonical order.
    async fn overview(&self) -> Result<Vec<BloodTypeAvailability>, Error>;
}
