//! PostgreSQL-backed `BloodRequestRepository`.
//!
//! Status changes are `UPDATE .. WHERE id = $1 AND status = $from`. Zero
//! affected rows is followed by a read to tell a conflict from a missing
//! request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::Mutex;

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{BloodRequestRow, NewBloodRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::blood_requests;
use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, RequestFilter, TransitionOutcome,
};
use crate::domain::{BloodRequest, ChangeOperation, RequestId, RequestStatus};
use crate::outbound::change_hub::ChangeHub;
use crate::outbound::change_records::blood_request_event;

/// `BloodRequestRepository` over the `blood_requests` table.
pub struct DieselBloodRequestRepository {
    pool: DbPool,
    hub: ChangeHub,
    publish_order: Mutex<()>,
}

impl DieselBloodRequestRepository {
    pub fn new(pool: DbPool, hub: ChangeHub) -> Self {
        Self {
            pool,
            hub,
            publish_order: Mutex::new(()),
        }
    }
}

fn pool_error(error: PoolError) -> BloodRequestRepositoryError {
    map_pool_error(error, BloodRequestRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BloodRequestRepositoryError {
    map_diesel_error(
        error,
        BloodRequestRepositoryError::query,
        BloodRequestRepositoryError::connection,
    )
}

fn decode(row: BloodRequestRow) -> Result<BloodRequest, BloodRequestRepositoryError> {
    BloodRequest::try_from(row).map_err(|err| BloodRequestRepositoryError::query(err.to_string()))
}

fn blood_group_labels(filter: &RequestFilter) -> Option<Vec<&'static str>> {
    filter
        .blood_groups
        .as_ref()
        .map(|groups| groups.iter().map(|group| group.as_str()).collect())
}

#[async_trait]
impl BloodRequestRepository for DieselBloodRequestRepository {
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError> {
        let row = NewBloodRequestRow::from(request);

        let _ordered = self.publish_order.lock().await;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(blood_requests::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    BloodRequestRepositoryError::duplicate(request.id.to_string())
                } else {
                    diesel_error(err)
                }
            })?;
        self.hub
            .publish(blood_request_event(ChangeOperation::Insert, request));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = blood_requests::table
            .filter(blood_requests::id.eq(id.as_uuid()))
            .select(BloodRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(decode).transpose()
    }

    async fn list(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError> {
        let mut query = blood_requests::table
            .select(BloodRequestRow::as_select())
            .order_by((blood_requests::created_at.asc(), blood_requests::id.asc()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(blood_requests::status.eq(status.as_str()));
        }
        if let Some(groups) = blood_group_labels(filter) {
            query = query.filter(blood_requests::blood_group.eq_any(groups));
        }
        if let Some(user_id) = filter.created_by {
            query = query.filter(blood_requests::user_id.eq(*user_id.as_uuid()));
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<BloodRequestRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(decode).collect()
    }

    async fn transition(
        &self,
        id: &RequestId,
        from: RequestStatus,
        to: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, BloodRequestRepositoryError> {
        let _ordered = self.publish_order.lock().await;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated: Option<BloodRequestRow> = diesel::update(
            blood_requests::table
                .filter(blood_requests::id.eq(id.as_uuid()))
                .filter(blood_requests::status.eq(from.as_str())),
        )
        .set((
            blood_requests::status.eq(to.as_str()),
            blood_requests::updated_at.eq(at),
        ))
        .returning(BloodRequestRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        if let Some(row) = updated {
            let request = decode(row)?;
            self.hub
                .publish(blood_request_event(ChangeOperation::Update, &request));
            return Ok(TransitionOutcome::Applied(request));
        }

        let current: Option<String> = blood_requests::table
            .filter(blood_requests::id.eq(id.as_uuid()))
            .select(blood_requests::status)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match current {
            None => Ok(TransitionOutcome::NotFound),
            Some(label) => {
                let current = label.parse::<RequestStatus>().map_err(|_| {
                    BloodRequestRepositoryError::query(format!("undecodable status {label}"))
                })?;
                Ok(TransitionOutcome::Conflict { current })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BloodType;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let err = diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        ));
        assert!(matches!(err, BloodRequestRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        let err = pool_error(PoolError::build("bad url"));
        assert!(err.to_string().contains("bad url"));
    }

    #[rstest]
    fn blood_group_filters_use_stored_labels() {
        let filter =
            RequestFilter::all().with_blood_groups([BloodType::AbPositive, BloodType::ONegative]);
        assert_eq!(blood_group_labels(&filter), Some(vec!["AB+", "O-"]));
        assert_eq!(blood_group_labels(&RequestFilter::all()), None);
    }
}
