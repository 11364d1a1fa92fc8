//! Blood-unit ledger entities.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BloodType, FieldViolation, HospitalId, InventoryRecordId};

/// Ledger key: one record per hospital and blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryKey {
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
}

impl InventoryKey {
    pub const fn new(hospital_id: HospitalId, blood_type: BloodType) -> Self {
        Self {
            hospital_id,
            blood_type,
        }
    }
}

/// Units of one blood type held by one hospital.
///
/// `units` is unsigned; the stores additionally refuse any write that would
/// take it below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: InventoryRecordId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units: u32,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.hospital_id, self.blood_type)
    }
}

/// A strictly positive number of units to add or withdraw.
///
/// # Examples
/// ```
/// use bloodlink::domain::UnitCount;
///
/// assert_eq!(UnitCount::parse("units", 3).map(UnitCount::get), Ok(3));
/// assert!(UnitCount::parse("units", 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitCount(NonZeroU32);

impl UnitCount {
    /// Validate a caller-supplied count, reporting failures against `field`.
    ///
    /// Counts above `i32::MAX` are refused as `too_large`, matching the
    /// width of the stored balance.
    pub fn parse(field: &str, raw: i64) -> Result<Self, FieldViolation> {
        if raw <= 0 {
            return Err(FieldViolation::new(
                field,
                "must_be_positive",
                format!("{field} must be at least 1"),
            ));
        }
        let too_large =
            || FieldViolation::new(field, "too_large", format!("{field} is too large"));
        if raw > i64::from(i32::MAX) {
            return Err(too_large());
        }
        u32::try_from(raw)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(too_large)
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Units on hand across all hospitals for one blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTotal {
    pub blood_type: BloodType,
    pub units: u64,
}
