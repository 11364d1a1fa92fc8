//! Driving port for donor-to-request matching.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BloodRequest, BloodType, DonorId, Error, Location};

/// Open requests a donor could serve, split by locality.
///
/// Each list is ordered by urgency (most urgent first), then by creation
/// time (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub local: Vec<BloodRequest>,
    pub other: Vec<BloodRequest>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.local.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.other.is_empty()
    }
}

/// Driving port answering "which requests can this donor serve".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchQuery: Send + Sync {
    async fn find_matches(
        &self,
        donor_type: BloodType,
        donor_location: &Location,
    ) -> Result<MatchResult, Error>;

    /// Matches for a registered donor.
    ///
    /// # Errors
    ///
    /// `not_found` for unknown donors and `invalid_request` for deactivated
    /// ones.
    async fn matches_for_donor(&self, donor_id: &DonorId) -> Result<MatchResult, Error>;
}
