//! Inventory ledger service.
//!
//! Implements the inventory driving ports. The service validates the caller,
//! the hospital, and the count, then hands the arithmetic to the store as a
//! single conditional write; it never reads a balance and writes it back.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    DecrementOutcome, HospitalRepository, HospitalRepositoryError, InventoryAdjustment,
    InventoryCommand, InventoryQuery, InventoryRepository, InventoryRepositoryError,
};
use crate::domain::{
    Error, FieldViolation, HospitalId, InventoryKey, InventoryRecord, InventoryTotal, Role,
    Session, UnitCount,
};

/// Ledger of per-hospital blood unit counts.
#[derive(Clone)]
pub struct InventoryLedgerService<I, H> {
    inventory: Arc<I>,
    hospitals: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<I, H> InventoryLedgerService<I, H> {
    /// Ledger over the given stores, stamping writes with `clock`.
    pub fn new(inventory: Arc<I>, hospitals: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inventory,
            hospitals,
            clock,
        }
    }
}

impl<I, H> InventoryLedgerService<I, H>
where
    I: InventoryRepository,
    H: HospitalRepository,
{
    fn map_inventory_error(error: InventoryRepositoryError) -> Error {
        match error {
            InventoryRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("inventory store unavailable: {message}"))
            }
            InventoryRepositoryError::Query { message } => {
                Error::internal(format!("inventory store error: {message}"))
            }
        }
    }

    fn map_hospital_error(error: HospitalRepositoryError) -> Error {
        match error {
            HospitalRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("hospital store unavailable: {message}"))
            }
            HospitalRepositoryError::Query { message } => {
                Error::internal(format!("hospital store error: {message}"))
            }
        }
    }

    /// Authorise the caller and validate the adjustment before any write.
    ///
    /// Hospital users may only adjust their own hospital; admins may adjust
    /// any.
    async fn prepare(
        &self,
        session: &Session,
        adjustment: &InventoryAdjustment,
    ) -> Result<(InventoryKey, UnitCount), Error> {
        session.require_operator("adjust inventory")?;

        let hospital = self
            .hospitals
            .find_by_id(&adjustment.hospital_id)
            .await
            .map_err(Self::map_hospital_error)?
            .ok_or_else(|| {
                Error::not_found(format!("hospital {} not found", adjustment.hospital_id))
            })?;
        if session.role() == Role::Hospital && hospital.user_id != *session.user_id() {
            warn!(
                hospital_id = %adjustment.hospital_id,
                user_id = %session.user_id(),
                "inventory adjustment refused for another hospital"
            );
            return Err(Error::forbidden(
                "hospital users may only adjust their own inventory",
            ));
        }

        let mut violations = Vec::new();
        if !hospital.is_active() {
            violations.push(FieldViolation::new(
                "hospitalId",
                "hospital_inactive",
                "hospital is not active",
            ));
        }
        let count = UnitCount::parse("units", adjustment.units)
            .map_err(|violation| violations.push(violation))
            .ok();

        match count {
            Some(count) if violations.is_empty() => Ok((
                InventoryKey::new(adjustment.hospital_id, adjustment.blood_type),
                count,
            )),
            _ => Err(Error::validation(violations)),
        }
    }
}

#[async_trait]
impl<I, H> InventoryCommand for InventoryLedgerService<I, H>
where
    I: InventoryRepository,
    H: HospitalRepository,
{
    async fn add_units(
        &self,
        session: &Session,
        adjustment: InventoryAdjustment,
    ) -> Result<InventoryRecord, Error> {
        let (key, count) = self.prepare(session, &adjustment).await?;
        let record = self
            .inventory
            .increment(&key, count, self.clock.utc())
            .await
            .map_err(Self::map_inventory_error)?;
        info!(
            hospital_id = %key.hospital_id,
            blood_type = %key.blood_type,
            added = count.get(),
            units = record.units,
            user_id = %session.user_id(),
            "inventory units added"
        );
        Ok(record)
    }

    async fn remove_units(
        &self,
        session: &Session,
        adjustment: InventoryAdjustment,
    ) -> Result<InventoryRecord, Error> {
        let (key, count) = self.prepare(session, &adjustment).await?;
        let outcome = self
            .inventory
            .decrement_if_available(&key, count, self.clock.utc())
            .await
            .map_err(Self::map_inventory_error)?;
        match outcome {
            DecrementOutcome::Applied(record) => {
                info!(
                    hospital_id = %key.hospital_id,
                    blood_type = %key.blood_type,
                    removed = count.get(),
                    units = record.units,
                    user_id = %session.user_id(),
                    "inventory units removed"
                );
                Ok(record)
            }
            DecrementOutcome::Insufficient { available } => {
                warn!(
                    hospital_id = %key.hospital_id,
                    blood_type = %key.blood_type,
                    requested = count.get(),
                    available,
                    "inventory withdrawal refused"
                );
                Err(Error::insufficient_stock(format!(
                    "only {available} units of {} on hand",
                    key.blood_type
                ))
                .with_details(json!({
                    "hospitalId": key.hospital_id,
                    "bloodType": key.blood_type,
                    "requested": count.get(),
                    "available": available,
                })))
            }
        }
    }
}

#[async_trait]
impl<I, H> InventoryQuery for InventoryLedgerService<I, H>
where
    I: InventoryRepository,
    H: HospitalRepository,
{
    async fn units(&self, key: &InventoryKey) -> Result<u32, Error> {
        let record = self
            .inventory
            .find(key)
            .await
            .map_err(Self::map_inventory_error)?;
        Ok(record.map_or(0, |record| record.units))
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<InventoryRecord>, Error> {
        self.hospitals
            .find_by_id(hospital_id)
            .await
            .map_err(Self::map_hospital_error)?
            .ok_or_else(|| Error::not_found(format!("hospital {hospital_id} not found")))?;
        self.inventory
            .list_for_hospital(hospital_id)
            .await
            .map_err(Self::map_inventory_error)
    }

    async fn totals_by_blood_type(&self) -> Result<Vec<InventoryTotal>, Error> {
        self.inventory
            .totals_by_blood_type()
            .await
            .map_err(Self::map_inventory_error)
    }
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
