//! PostgreSQL-backed `InventoryRepository`.
//!
//! Every mutation is one conditional statement, so PostgreSQL row locking is
//! what serialises concurrent adjustments to the same `(hospital, type)`:
//!
//! - deposits are `INSERT .. ON CONFLICT (hospital_id, blood_group) DO UPDATE
//!   SET units = units + n`;
//! - withdrawals are `UPDATE .. SET units = units - n WHERE units >= n`,
//!   followed by a read only when no row was updated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{InventoryRow, NewInventoryRow, RowDecodeError};
use super::pool::{DbPool, PoolError};
use super::schema::blood_inventory;
use crate::domain::ports::{DecrementOutcome, InventoryRepository, InventoryRepositoryError};
use crate::domain::{
    BloodType, ChangeOperation, HospitalId, InventoryKey, InventoryRecord, InventoryTotal,
    UnitCount,
};
use crate::outbound::change_hub::ChangeHub;
use crate::outbound::change_records::inventory_event;

/// Diesel adapter for the blood-unit ledger.
///
/// Writes made through this adapter are published to the [`ChangeHub`] once
/// committed. `publish_order` keeps publication in commit order for writers
/// in this process.
pub struct DieselInventoryRepository {
    pool: DbPool,
    hub: ChangeHub,
    publish_order: Mutex<()>,
}

impl DieselInventoryRepository {
    pub fn new(pool: DbPool, hub: ChangeHub) -> Self {
        Self {
            pool,
            hub,
            publish_order: Mutex::new(()),
        }
    }
}

fn pool_error(error: PoolError) -> InventoryRepositoryError {
    map_pool_error(error, InventoryRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> InventoryRepositoryError {
    map_diesel_error(
        error,
        InventoryRepositoryError::query,
        InventoryRepositoryError::connection,
    )
}

fn decode(row: InventoryRow) -> Result<InventoryRecord, InventoryRepositoryError> {
    InventoryRecord::try_from(row)
        .map_err(|err: RowDecodeError| InventoryRepositoryError::query(err.to_string()))
}

fn count_to_column(count: UnitCount) -> Result<i32, InventoryRepositoryError> {
    i32::try_from(count.get())
        .map_err(|_| InventoryRepositoryError::query("unit count exceeds column range"))
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn find(
        &self,
        key: &InventoryKey,
    ) -> Result<Option<InventoryRecord>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = blood_inventory::table
            .filter(blood_inventory::hospital_id.eq(key.hospital_id.as_uuid()))
            .filter(blood_inventory::blood_group.eq(key.blood_type.as_str()))
            .select(InventoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(decode).transpose()
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<InventoryRecord>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<InventoryRow> = blood_inventory::table
            .filter(blood_inventory::hospital_id.eq(hospital_id.as_uuid()))
            .select(InventoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let mut records = rows
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|record| record.blood_type);
        Ok(records)
    }

    async fn increment(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<InventoryRecord, InventoryRepositoryError> {
        let delta = count_to_column(count)?;
        let candidate_id = Uuid::new_v4();
        let row = NewInventoryRow {
            id: candidate_id,
            hospital_id: *key.hospital_id.as_uuid(),
            blood_group: key.blood_type.as_str(),
            units: delta,
            updated_at: at,
        };

        let _ordered = self.publish_order.lock().await;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let stored: InventoryRow = diesel::insert_into(blood_inventory::table)
            .values(&row)
            .on_conflict((blood_inventory::hospital_id, blood_inventory::blood_group))
            .do_update()
            .set((
                blood_inventory::units.eq(blood_inventory::units + delta),
                blood_inventory::updated_at.eq(at),
            ))
            .returning(InventoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        // The candidate id survives only when the row was created.
        let operation = if stored.id == candidate_id {
            ChangeOperation::Insert
        } else {
            ChangeOperation::Update
        };
        let record = decode(stored)?;
        self.hub.publish(inventory_event(operation, &record));
        Ok(record)
    }

    async fn decrement_if_available(
        &self,
        key: &InventoryKey,
        count: UnitCount,
        at: DateTime<Utc>,
    ) -> Result<DecrementOutcome, InventoryRepositoryError> {
        let delta = count_to_column(count)?;

        let _ordered = self.publish_order.lock().await;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated: Option<InventoryRow> = diesel::update(
            blood_inventory::table
                .filter(blood_inventory::hospital_id.eq(key.hospital_id.as_uuid()))
                .filter(blood_inventory::blood_group.eq(key.blood_type.as_str()))
                .filter(blood_inventory::units.ge(delta)),
        )
        .set((
            blood_inventory::units.eq(blood_inventory::units - delta),
            blood_inventory::updated_at.eq(at),
        ))
        .returning(InventoryRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        if let Some(row) = updated {
            let record = decode(row)?;
            self.hub
                .publish(inventory_event(ChangeOperation::Update, &record));
            return Ok(DecrementOutcome::Applied(record));
        }

        let available: Option<i32> = blood_inventory::table
            .filter(blood_inventory::hospital_id.eq(key.hospital_id.as_uuid()))
            .filter(blood_inventory::blood_group.eq(key.blood_type.as_str()))
            .select(blood_inventory::units)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(DecrementOutcome::Insufficient {
            available: available.map_or(0, |units| u32::try_from(units).unwrap_or(0)),
        })
    }

    async fn totals_by_blood_type(&self) -> Result<Vec<InventoryTotal>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let sums: Vec<(String, Option<i64>)> = blood_inventory::table
            .group_by(blood_inventory::blood_group)
            .select((
                blood_inventory::blood_group,
                diesel::dsl::sum(blood_inventory::units),
            ))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        let mut totals: Vec<InventoryTotal> = BloodType::ALL
            .into_iter()
            .map(|blood_type| InventoryTotal {
                blood_type,
                units: 0,
            })
            .collect();
        for (label, units) in sums {
            let blood_type: BloodType = label.parse().map_err(|_| {
                InventoryRepositoryError::query(format!("undecodable blood_group {label}"))
            })?;
            if let Some(total) = totals.iter_mut().find(|t| t.blood_type == blood_type) {
                total.units = units.and_then(|u| u64::try_from(u).ok()).unwrap_or(0);
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err = pool_error(PoolError::checkout("refused"));
        assert!(matches!(err, InventoryRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn missing_rows_become_query_errors() {
        let err = diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(err, InventoryRepositoryError::Query { .. }));
    }

    #[rstest]
    #[case(40, 40)]
    #[case(i64::from(i32::MAX), i32::MAX)]
    fn accepted_counts_fit_the_column(#[case] raw: i64, #[case] column: i32) {
        let count = UnitCount::parse("units", raw).expect("accepted count");
        assert_eq!(count_to_column(count).expect("fits"), column);
    }

    #[rstest]
    fn totals_are_summed_per_blood_group() {
        let query = blood_inventory::table
            .group_by(blood_inventory::blood_group)
            .select((
                blood_inventory::blood_group,
                diesel::dsl::sum(blood_inventory::units),
            ));
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query)
            .to_string()
            .to_lowercase();

        assert!(sql.contains("sum(\"blood_inventory\".\"units\")"), "{sql}");
        assert!(sql.contains("group by \"blood_inventory\".\"blood_group\""), "{sql}");
    }
}
