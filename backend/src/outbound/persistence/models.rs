//! Diesel row structs and their conversions to domain entities.
//!
//! Rows stay inside the persistence module. Text columns holding enums are
//! parsed on the way out; a value the domain does not recognise is reported
//! as a [`RowDecodeError`] rather than silently defaulted.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{blood_inventory, blood_requests, donors, hospitals};
use crate::domain::{
    BloodRequest, BloodType, Donor, DonorId, Hospital, HospitalId, HospitalStatus,
    InventoryRecord, InventoryRecordId, Location, RequestId, RequestStatus, Urgency, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("undecodable {column} value in {table}: {value}")]
pub(crate) struct RowDecodeError {
    table: &'static str,
    column: &'static str,
    value: String,
}

impl RowDecodeError {
    fn new(table: &'static str, column: &'static str, value: impl ToString) -> Self {
        Self {
            table,
            column,
            value: value.to_string(),
        }
    }
}

fn parse_column<T: FromStr>(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<T, RowDecodeError> {
    raw.parse()
        .map_err(|_| RowDecodeError::new(table, column, raw))
}

fn units_from_column(table: &'static str, raw: i32) -> Result<u32, RowDecodeError> {
    u32::try_from(raw).map_err(|_| RowDecodeError::new(table, "units", raw))
}

/// Domain unit counts are bounded well below `i32::MAX` by validation; the
/// database column is `INTEGER`.
pub(crate) fn units_to_column(units: u32) -> i32 {
    i32::try_from(units).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blood_inventory)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InventoryRow {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub blood_group: String,
    pub units: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blood_inventory)]
pub(crate) struct NewInventoryRow<'a> {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub blood_group: &'a str,
    pub units: i32,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = RowDecodeError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InventoryRecordId::from_uuid(row.id),
            hospital_id: HospitalId::from_uuid(row.hospital_id),
            blood_type: parse_column("blood_inventory", "blood_group", &row.blood_group)?,
            units: units_from_column("blood_inventory", row.units)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blood_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BloodRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub patient_name: String,
    pub blood_group: String,
    pub units: i32,
    pub urgency: String,
    pub hospital: String,
    pub location: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blood_requests)]
pub(crate) struct NewBloodRequestRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub patient_name: &'a str,
    pub blood_group: &'a str,
    pub units: i32,
    pub urgency: &'a str,
    pub hospital: &'a str,
    pub location: &'a str,
    pub contact_name: &'a str,
    pub contact_phone: &'a str,
    pub notes: Option<&'a str>,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a BloodRequest> for NewBloodRequestRow<'a> {
    fn from(request: &'a BloodRequest) -> Self {
        Self {
            id: *request.id.as_uuid(),
            user_id: *request.created_by.as_uuid(),
            patient_name: &request.patient_name,
            blood_group: request.blood_group.as_str(),
            units: units_to_column(request.units),
            urgency: request.urgency.as_str(),
            hospital: &request.hospital,
            location: request.location.as_str(),
            contact_name: &request.contact_name,
            contact_phone: &request.contact_phone,
            notes: request.notes.as_deref(),
            status: request.status.as_str(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

impl TryFrom<BloodRequestRow> for BloodRequest {
    type Error = RowDecodeError;

    fn try_from(row: BloodRequestRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "blood_requests";
        Ok(Self {
            id: RequestId::from_uuid(row.id),
            patient_name: row.patient_name,
            blood_group: parse_column::<BloodType>(TABLE, "blood_group", &row.blood_group)?,
            units: units_from_column(TABLE, row.units)?,
            urgency: parse_column::<Urgency>(TABLE, "urgency", &row.urgency)?,
            hospital: row.hospital,
            location: Location::new(row.location),
            contact_name: row.contact_name,
            contact_phone: row.contact_phone,
            notes: row.notes,
            status: parse_column::<RequestStatus>(TABLE, "status", &row.status)?,
            created_by: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = donors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DonorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: String,
    pub location: String,
    pub last_donation: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DonorRow> for Donor {
    type Error = RowDecodeError;

    fn try_from(row: DonorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DonorId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            blood_type: parse_column("donors", "blood_group", &row.blood_group)?,
            location: Location::new(row.location),
            last_donation: row.last_donation,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hospitals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HospitalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<HospitalRow> for Hospital {
    type Error = RowDecodeError;

    fn try_from(row: HospitalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: HospitalId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            location: Location::new(row.location),
            contact_person: row.contact_person,
            phone: row.phone,
            email: row.email,
            description: row.description,
            status: parse_column::<HospitalStatus>("hospitals", "status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{fixture_timestamp, sample_request};
    use rstest::rstest;

    fn inventory_row(blood_group: &str, units: i32) -> InventoryRow {
        InventoryRow {
            id: Uuid::new_v4(),
            hospital_id: Uuid::new_v4(),
            blood_group: blood_group.to_owned(),
            units,
            updated_at: fixture_timestamp(),
        }
    }

    #[rstest]
    fn inventory_rows_decode_blood_type_labels() {
        let record = InventoryRecord::try_from(inventory_row("AB-", 7)).expect("decodes");

        assert_eq!(record.blood_type, BloodType::AbNegative);
        assert_eq!(record.units, 7);
    }

    #[rstest]
    #[case("Z+", 1, "blood_group")]
    #[case("O+", -1, "units")]
    fn corrupt_inventory_rows_are_rejected(
        #[case] blood_group: &str,
        #[case] units: i32,
        #[case] column: &str,
    ) {
        let err = InventoryRecord::try_from(inventory_row(blood_group, units)).expect_err("rejects");

        assert!(err.to_string().contains(column), "unexpected error: {err}");
    }

    #[rstest]
    fn request_rows_carry_every_column() {
        let request = sample_request(BloodType::BPositive);
        let new_row = NewBloodRequestRow::from(&request);

        let row = BloodRequestRow {
            id: new_row.id,
            user_id: new_row.user_id,
            patient_name: new_row.patient_name.to_owned(),
            blood_group: new_row.blood_group.to_owned(),
            units: new_row.units,
            urgency: new_row.urgency.to_owned(),
            hospital: new_row.hospital.to_owned(),
            location: new_row.location.to_owned(),
            contact_name: new_row.contact_name.to_owned(),
            contact_phone: new_row.contact_phone.to_owned(),
            notes: new_row.notes.map(str::to_owned),
            status: new_row.status.to_owned(),
            created_at: new_row.created_at,
            updated_at: new_row.updated_at,
        };

        assert_eq!(BloodRequest::try_from(row).expect("decodes"), request);
    }

    #[rstest]
    fn unknown_hospital_status_is_rejected() {
        let row = HospitalRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "St Mary".to_owned(),
            location: "Springfield".to_owned(),
            contact_person: "Dr Hibbert".to_owned(),
            phone: "555-0100".to_owned(),
            email: "ops@stmary.example".to_owned(),
            description: None,
            status: "suspended".to_owned(),
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        };

        let err = Hospital::try_from(row).expect_err("rejects");
        assert!(err.to_string().contains("suspended"));
    }
}
