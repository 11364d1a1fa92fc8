//! Shared builders and doubles for domain unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use super::{
    BloodRequest, BloodType, Donor, DonorId, Hospital, HospitalId, HospitalStatus, Location,
    RequestId, RequestStatus, Urgency, UserId,
};

pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock that advances one second every time it is read, so successive
/// writes get distinct, ordered timestamps.
pub struct SteppingClock(Mutex<DateTime<Utc>>);

impl SteppingClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut now = self.0.lock().expect("clock mutex");
        let current = *now;
        *now += TimeDelta::seconds(1);
        current
    }
}

pub fn sample_request(blood_group: BloodType) -> BloodRequest {
    BloodRequest {
        id: RequestId::random(),
        patient_name: "Grace Hopper".to_owned(),
        blood_group,
        units: 2,
        urgency: Urgency::High,
        hospital: "General".to_owned(),
        location: Location::new("Springfield"),
        contact_name: "Ward 4".to_owned(),
        contact_phone: "555-0100".to_owned(),
        notes: None,
        status: RequestStatus::Pending,
        created_by: UserId::random(),
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

pub fn sample_hospital(status: HospitalStatus) -> Hospital {
    Hospital {
        id: HospitalId::random(),
        user_id: UserId::random(),
        name: "Springfield General".to_owned(),
        location: Location::new("Springfield"),
        contact_person: "Dr. Hibbert".to_owned(),
        phone: "555-0199".to_owned(),
        email: "blood@springfield.example".to_owned(),
        description: None,
        status,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

pub fn sample_donor(blood_type: BloodType, location: &str) -> Donor {
    Donor {
        id: DonorId::random(),
        user_id: UserId::random(),
        name: "Homer".to_owned(),
        email: "homer@example.com".to_owned(),
        phone: "555-0123".to_owned(),
        blood_type,
        location: Location::new(location),
        last_donation: None,
        active: true,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}
