//! Port for the blood-unit ledger store.
//!
//! The store is the serialisation point for ledger mutations: each
//! increment and each check-and-decrement is a single conditional write, so
//! concurrent withdrawals can never drive `units` below zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{HospitalId, InventoryKey, InventoryRecord, InventoryTotal, UnitCount};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inventory repository adapters.
    pub enum InventoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message } =>
            "inventory repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } =>
            "inventory repository query failed: {message}",
    }
}

/// Result of a conditional withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Units were withdrawn; carries the updated record.
    Applied(InventoryRecord),
    /// Not enough units on hand; nothing was written.
    Insufficient { available: u32 },
}

/// Driven port holding unit balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find(
        &self,
        key: &InventoryKey,
    ) -> Result<Option<InventoryRecord>, InventoryRepositoryError>;

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<InventoryRecord>, InventoryRepositoryError>;

    /// Add units, creating the record at zero first if it does not exist.
    async fn increment(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<InventoryRecord, InventoryRepositoryError>;

    /// Withdraw units only if at least `count` are on hand.
    ///
    /// A missing record counts as zero units on hand.
    async fn decrement_if_available(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<DecrementOutcome, InventoryRepositoryError>;

    /// Units on hand per blood type across all hospitals.
    async fn totals_by_blood_type(&self) -> Result<Vec<InventoryTotal>, InventoryRepositoryError>;
}
