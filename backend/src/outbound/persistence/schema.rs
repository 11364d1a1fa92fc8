//! Diesel table definitions.
//!
//! Must match `backend/migrations`. Regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    donors (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Text,
        email -> Text,
        phone -> Text,
        /// Blood type label such as `AB+`.
        blood_group -> Text,
        location -> Text,
        last_donation -> Nullable<Date>,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    hospitals (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Text,
        location -> Text,
        contact_person -> Text,
        phone -> Text,
        email -> Text,
        description -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per `(hospital_id, blood_group)`; `units` is never negative.
    blood_inventory (id) {
        id -> Uuid,
        hospital_id -> Uuid,
        blood_group -> Text,
        units -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    blood_requests (id) {
        id -> Uuid,
        user_id -> Uuid,
        patient_name -> Text,
        blood_group -> Text,
        units -> Int4,
        urgency -> Text,
        hospital -> Text,
        location -> Text,
        contact_name -> Text,
        contact_phone -> Text,
        notes -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(blood_inventory -> hospitals (hospital_id));

diesel::allow_tables_to_appear_in_same_query!(donors, hospitals, blood_inventory, blood_requests);
