//! Donor profiles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BloodType, DonorId, Location, UserId};

/// A registered donor.
///
/// Donors are never deleted; `active` is cleared instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: DonorId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_type: BloodType,
    pub location: Location,
    pub last_donation: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
