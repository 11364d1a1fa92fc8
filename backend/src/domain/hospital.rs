//! Hospitals holding blood inventory.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HospitalId, Location, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HospitalStatus {
    Active,
    Inactive,
}

impl HospitalStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hospital status: {0}")]
pub struct ParseHospitalStatusError(String);

impl FromStr for HospitalStatus {
    type Err = ParseHospitalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ParseHospitalStatusError(other.to_owned())),
        }
    }
}

/// A hospital registered on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: HospitalId,
    pub user_id: UserId,
    pub name: String,
    pub location: Location,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub description: Option<String>,
    pub status: HospitalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hospital {
    pub fn is_active(&self) -> bool {
        self.status == HospitalStatus::Active
    }
}
