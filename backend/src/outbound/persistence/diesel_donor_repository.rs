//! PostgreSQL-backed `DonorRepository`.
//!
//! Donor rows are owned by the donor registration flow; this adapter only
//! reads them.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::DonorRow;
use super::pool::{DbPool, PoolError};
use super::schema::donors;
use crate::domain::ports::{DonorRepository, DonorRepositoryError};
use crate::domain::{Donor, DonorId};

/// `DonorRepository` over the `donors` table.
#[derive(Clone)]
pub struct DieselDonorRepository {
    pool: DbPool,
}

impl DieselDonorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> DonorRepositoryError {
    map_pool_error(error, DonorRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> DonorRepositoryError {
    map_diesel_error(
        error,
        DonorRepositoryError::query,
        DonorRepositoryError::connection,
    )
}

fn decode(row: Option<DonorRow>) -> Result<Option<Donor>, DonorRepositoryError> {
    row.map(|row| Donor::try_from(row).map_err(|err| DonorRepositoryError::query(err.to_string())))
        .transpose()
}

#[async_trait]
impl DonorRepository for DieselDonorRepository {
    async fn find_by_id(&self, id: &DonorId) -> Result<Option<Donor>, DonorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = donors::table
            .filter(donors::id.eq(id.as_uuid()))
            .select(DonorRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        decode(row)
    }
}
