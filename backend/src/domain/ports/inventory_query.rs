//! Driving port for reading the ledger.

use async_trait::async_trait;

use crate::domain::{Error, HospitalId, InventoryKey, InventoryRecord, InventoryTotal};

/// Driving port for reading balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryQuery: Send + Sync {
    /// Units on hand for one key; zero when no record exists.
    async fn units(&self, key: &InventoryKey) -> Result<u32, Error>;

    async fn list_for_hospital(&self, hospital_id: &HospitalId)
    -> Result<Vec<InventoryRecord>, Error>;

    /// Stock on hand across all hospitals, one entry per blood type.
    async fn totals_by_blood_type(&self) -> Result<Vec<InventoryTotal>, Error>;
}
