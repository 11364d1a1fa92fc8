//! PostgreSQL-backed `HospitalRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::HospitalRow;
use super::pool::DbPool;
use super::schema::hospitals;
use crate::domain::ports::{HospitalRepository, HospitalRepositoryError};
use crate::domain::{Hospital, HospitalId};

/// `HospitalRepository` over the `hospitals` table.
#[derive(Clone)]
pub struct DieselHospitalRepository {
    pool: DbPool,
}

impl DieselHospitalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HospitalRepository for DieselHospitalRepository {
    async fn find_by_id(
        &self,
        id: &HospitalId,
    ) -> Result<Option<Hospital>, HospitalRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, HospitalRepositoryError::connection))?;
        let row: Option<HospitalRow> = hospitals::table
            .filter(hospitals::id.eq(id.as_uuid()))
            .select(HospitalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(
                    err,
                    HospitalRepositoryError::query,
                    HospitalRepositoryError::connection,
                )
            })?;
        row.map(|row| {
            Hospital::try_from(row).map_err(|err| HospitalRepositoryError::query(err.to_string()))
        })
        .transpose()
    }
}
