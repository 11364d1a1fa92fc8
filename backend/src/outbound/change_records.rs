//! Row images carried by change events.
//!
//! Records are keyed by column name exactly as persisted, so a
//! [`TableFilter`](crate::domain::TableFilter) column filter means the same
//! thing against either store.

use serde_json::{Value, json};

use crate::domain::{
    BloodRequest, ChangeEvent, ChangeOperation, Donor, Hospital, InventoryRecord, Table,
};

pub fn inventory_row(record: &InventoryRecord) -> Value {
    json!({
        "id": record.id,
        "hospital_id": record.hospital_id,
        "blood_group": record.blood_type,
        "units": record.units,
        "updated_at": record.updated_at,
    })
}

pub fn blood_request_row(request: &BloodRequest) -> Value {
    json!({
        "id": request.id,
        "user_id": request.created_by,
        "patient_name": request.patient_name,
        "blood_group": request.blood_group,
        "units": request.units,
        "urgency": request.urgency,
        "hospital": request.hospital,
        "location": request.location,
        "contact_name": request.contact_name,
        "contact_phone": request.contact_phone,
        "notes": request.notes,
        "status": request.status,
        "created_at": request.created_at,
        "updated_at": request.updated_at,
    })
}

pub fn donor_row(donor: &Donor) -> Value {
    json!({
        "id": donor.id,
        "user_id": donor.user_id,
        "name": donor.name,
        "email": donor.email,
        "phone": donor.phone,
        "blood_group": donor.blood_type,
        "location": donor.location,
        "last_donation": donor.last_donation,
        "active": donor.active,
        "created_at": donor.created_at,
        "updated_at": donor.updated_at,
    })
}

pub fn hospital_row(hospital: &Hospital) -> Value {
    json!({
        "id": hospital.id,
        "user_id": hospital.user_id,
        "name": hospital.name,
        "location": hospital.location,
        "contact_person": hospital.contact_person,
        "phone": hospital.phone,
        "email": hospital.email,
        "description": hospital.description,
        "status": hospital.status,
        "created_at": hospital.created_at,
        "updated_at": hospital.updated_at,
    })
}

pub fn inventory_event(operation: ChangeOperation, record: &InventoryRecord) -> ChangeEvent {
    ChangeEvent::new(Table::BloodInventory, operation, inventory_row(record))
}

pub fn blood_request_event(operation: ChangeOperation, request: &BloodRequest) -> ChangeEvent {
    ChangeEvent::new(Table::BloodRequests, operation, blood_request_row(request))
}
