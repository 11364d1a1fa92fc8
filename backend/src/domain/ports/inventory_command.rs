//! Driving port for ledger mutations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BloodType, Error, HospitalId, InventoryRecord, Session};

/// Units to add to or withdraw from one ledger record.
///
/// `units` is taken as supplied so that zero and negative counts reach
/// validation and are reported against the `units` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustment {
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units: i64,
}

/// Driving port for inventory deposits and withdrawals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryCommand: Send + Sync {
    /// Increment the record, creating it if absent.
    async fn add_units(
        &self,
        session: &Session,
        adjustment: InventoryAdjustment,
    ) -> Result<InventoryRecord, Error>;

    /// Withdraw units.
    ///
    /// # Errors
    ///
    /// `insufficient_stock` when fewer units are on hand than requested; the
    /// ledger is left unchanged.
    async fn remove_units(
        &self,
        session: &Session,
        adjustment: InventoryAdjustment,
    ) -> Result<InventoryRecord, Error>;
}
