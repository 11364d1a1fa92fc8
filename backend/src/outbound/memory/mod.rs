//! In-memory store implementing every repository port.
//!
//! A single mutex guards all tables. Each mutation checks, writes, and
//! publishes its change event while holding the lock, so the order in which
//! events reach the [`ChangeHub`] is the order in which mutations committed.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::change_hub::ChangeHub;
use super::change_records::{
    blood_request_event, donor_row, hospital_row, inventory_event,
};
use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, DecrementOutcome, DonorRepository,
    DonorRepositoryError, HospitalRepository, HospitalRepositoryError, IdentityDirectory,
    IdentityDirectoryError, InventoryRepository, InventoryRepositoryError, RequestFilter,
    TransitionOutcome,
};
use crate::domain::{
    BloodRequest, BloodType, ChangeEvent, ChangeOperation, Donor, DonorId, Hospital, HospitalId,
    InventoryKey, InventoryRecord, InventoryRecordId, InventoryTotal, RequestId, RequestStatus,
    Table, UnitCount, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashSet<UserId>,
    donors: HashMap<DonorId, Donor>,
    hospitals: HashMap<HospitalId, Hospital>,
    inventory: HashMap<InventoryKey, InventoryRecord>,
    requests: HashMap<RequestId, BloodRequest>,
}

/// Process-local implementation of every driven port, publishing each
/// committed write to the [`ChangeHub`].
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    hub: ChangeHub,
}

impl InMemoryStore {
    pub fn new(hub: ChangeHub) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            hub,
        }
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an identity issued by the Auth collaborator.
    pub fn register_user(&self, user_id: UserId) {
        self.lock().users.insert(user_id);
    }

    pub fn insert_hospital(&self, hospital: Hospital) {
        let mut tables = self.lock();
        let event = ChangeEvent::new(Table::Hospitals, ChangeOperation::Insert, hospital_row(&hospital));
        tables.users.insert(hospital.user_id);
        tables.hospitals.insert(hospital.id, hospital);
        self.hub.publish(event);
    }

    pub fn insert_donor(&self, donor: Donor) {
        let mut tables = self.lock();
        let event = ChangeEvent::new(Table::Donors, ChangeOperation::Insert, donor_row(&donor));
        tables.users.insert(donor.user_id);
        tables.donors.insert(donor.id, donor);
        self.hub.publish(event);
    }

    /// Soft-deactivate a donor. Returns `false` when the donor is unknown.
    pub fn deactivate_donor(&self, donor_id: &DonorId, at: DateTime<Utc>) -> bool {
        let mut tables = self.lock();
        let Some(donor) = tables.donors.get_mut(donor_id) else {
            return false;
        };
        donor.active = false;
        donor.updated_at = at;
        let event = ChangeEvent::new(Table::Donors, ChangeOperation::Update, donor_row(donor));
        self.hub.publish(event);
        true
    }
}

#[async_trait]
impl InventoryRepository for InMemoryStore {
    async fn find(
        &self,
        key: &InventoryKey,
    ) -> Result<Option<InventoryRecord>, InventoryRepositoryError> {
        Ok(self.lock().inventory.get(key).cloned())
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<InventoryRecord>, InventoryRepositoryError> {
        let mut records: Vec<_> = self
            .lock()
            .inventory
            .values()
            .filter(|record| record.hospital_id == *hospital_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.blood_type);
        Ok(records)
    }

    async fn increment(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<InventoryRecord, InventoryRepositoryError> {
        let mut tables = self.lock();
        let (record, operation) = match tables.inventory.get_mut(key) {
            Some(record) => {
                record.units = record.units.checked_add(count.get()).ok_or_else(|| {
                    InventoryRepositoryError::query(format!("units overflow for {}", key.blood_type))
                })?;
                record.updated_at = at;
                (record.clone(), ChangeOperation::Update)
            }
            None => {
                let record = InventoryRecord {
                    id: InventoryRecordId::random(),
                    hospital_id: key.hospital_id,
                    blood_type: key.blood_type,
                    units: count.get(),
                    updated_at: at,
                };
                tables.inventory.insert(*key, record.clone());
                (record, ChangeOperation::Insert)
            }
        };
        self.hub.publish(inventory_event(operation, &record));
        Ok(record)
    }

    async fn decrement_if_available(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<DecrementOutcome, InventoryRepositoryError> {
        let mut tables = self.lock();
        let Some(record) = tables.inventory.get_mut(key) else {
            return Ok(DecrementOutcome::Insufficient { available: 0 });
        };
        let Some(remaining) = record.units.checked_sub(count.get()) else {
            return Ok(DecrementOutcome::Insufficient {
                available: record.units,
            });
        };
        record.units = remaining;
        record.updated_at = at;
        let record = record.clone();
        self.hub
            .publish(inventory_event(ChangeOperation::Update, &record));
        Ok(DecrementOutcome::Applied(record))
    }

    async fn totals_by_blood_type(&self) -> Result<Vec<InventoryTotal>, InventoryRepositoryError> {
        let tables = self.lock();
        Ok(BloodType::ALL
            .into_iter()
            .map(|blood_type| InventoryTotal {
                blood_type,
                units: tables
                    .inventory
                    .values()
                    .filter(|record| record.blood_type == blood_type)
                    .map(|record| u64::from(record.units))
                    .sum(),
            })
            .collect())
    }
}

#[async_trait]
impl BloodRequestRepository for InMemoryStore {
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError> {
        let mut tables = self.lock();
        if tables.requests.contains_key(&request.id) {
            return Err(BloodRequestRepositoryError::duplicate(request.id.to_string()));
        }
        tables.requests.insert(request.id, request.clone());
        self.hub
            .publish(blood_request_event(ChangeOperation::Insert, request));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        Ok(self.lock().requests.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let mut requests: Vec<_> = self
            .lock()
            .requests
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        requests.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(requests)
    }

    async fn transition(
        &self,
        id: &RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, BloodRequestRepositoryError> {
        let mut tables = self.lock();
        let Some(request) = tables.requests.get_mut(id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if request.status != from {
            return Ok(TransitionOutcome::Conflict {
                current: request.status,
            });
        }
        request.status = to;
        request.updated_at = at;
        let request = request.clone();
        self.hub
            .publish(blood_request_event(ChangeOperation::Update, &request));
        Ok(TransitionOutcome::Applied(request))
    }
}

#[async_trait]
impl DonorRepository for InMemoryStore {
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        Ok(self.lock().donors.get(id).cloned())
    }
}

#[async_trait]
impl HospitalRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: &HospitalId,
    ) -> Result<Option<Hospital>, HospitalRepositoryError> {
        Ok(self.lock().hospitals.get(id).cloned())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryStore {
    async fn is_known(&self, user_id: &UserId) -> Result<bool, IdentityDirectoryError> {
        Ok(self.lock().users.contains(user_id))
    }
}

#[cfg(test)]
mod tests;
