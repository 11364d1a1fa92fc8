//! Blood requests and their lifecycle states.
//!
//! ```text
//! pending --approve--> approved --fulfil--> fulfilled
//!    \
//!     `---reject---> rejected
//! ```
//!
//! `rejected` and `fulfilled` are terminal. Requests are never deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BloodType, FieldViolation, Location, RequestId, UnitCount, UserId};

/// Clinical urgency. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown urgency: {0}")]
pub struct ParseUrgencyError(String);

impl FromStr for Urgency {
    type Err = ParseUrgencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseUrgencyError(s.to_owned())),
        }
    }
}

/// Lifecycle status of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fulfilled => "fulfilled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request status: {0}")]
pub struct ParseRequestStatusError(String);

impl FromStr for RequestStatus {
    type Err = ParseRequestStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "fulfilled" => Ok(Self::Fulfilled),
            _ => Err(ParseRequestStatusError(s.to_owned())),
        }
    }
}

/// An operator-driven lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTransition {
    Approve,
    Reject,
    Fulfil,
}

impl RequestTransition {
    /// The only status this transition may start from.
    pub const fn source(self) -> RequestStatus {
        match self {
            Self::Approve | Self::Reject => RequestStatus::Pending,
            Self::Fulfil => RequestStatus::Approved,
        }
    }

    pub const fn target(self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
            Self::Fulfil => RequestStatus::Fulfilled,
        }
    }

    pub const fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Fulfil => "fulfil",
        }
    }
}

/// Raw request form as submitted by a collaborator.
///
/// Every field defaults so that missing input is reported through
/// validation alongside other offending fields rather than as a parse
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BloodRequestSubmission {
    pub patient_name: String,
    pub blood_group: String,
    pub units: i64,
    pub urgency: String,
    pub hospital: String,
    pub location: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub notes: Option<String>,
}

/// Typed request details produced by [`BloodRequestSubmission::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDetails {
    pub patient_name: String,
    pub blood_group: BloodType,
    pub units: UnitCount,
    pub urgency: Urgency,
    pub hospital: String,
    pub location: Location,
    pub contact_name: String,
    pub contact_phone: String,
    pub notes: Option<String>,
}

fn required_text(
    field: &str,
    raw: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        violations.push(FieldViolation::new(
            field,
            "required",
            format!("{field} must not be empty"),
        ));
        None
    } else {
        Some(trimmed.to_owned())
    }
}

impl BloodRequestSubmission {
    /// Check every field, collecting all violations rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<RequestDetails, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let patient_name = required_text("patientName", &self.patient_name, &mut violations);
        let blood_group = self
            .blood_group
            .parse::<BloodType>()
            .map_err(|err| {
                violations.push(FieldViolation::new(
                    "bloodGroup",
                    "unknown_blood_type",
                    err.to_string(),
                ));
            })
            .ok();
        let units = UnitCount::parse("units", self.units)
            .map_err(|violation| violations.push(violation))
            .ok();
        let urgency = self
            .urgency
            .parse::<Urgency>()
            .map_err(|err| {
                violations.push(FieldViolation::new(
                    "urgency",
                    "unknown_urgency",
                    err.to_string(),
                ));
            })
            .ok();
        let hospital = required_text("hospital", &self.hospital, &mut violations);
        let location = required_text("location", &self.location, &mut violations);
        let contact_name = required_text("contactName", &self.contact_name, &mut violations);
        let contact_phone = required_text("contactPhone", &self.contact_phone, &mut violations);

        match (
            patient_name,
            blood_group,
            units,
            urgency,
            hospital,
            location,
            contact_name,
            contact_phone,
        ) {
            (
                Some(patient_name),
                Some(blood_group),
                Some(units),
                Some(urgency),
                Some(hospital),
                Some(location),
                Some(contact_name),
                Some(contact_phone),
            ) if violations.is_empty() => Ok(RequestDetails {
                patient_name,
                blood_group,
                units,
                urgency,
                hospital,
                location: Location::new(location),
                contact_name,
                contact_phone,
                notes: self
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|notes| !notes.is_empty())
                    .map(str::to_owned),
            }),
            _ => Err(violations),
        }
    }
}

/// A persisted blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: RequestId,
    pub patient_name: String,
    pub blood_group: BloodType,
    pub units: u32,
    pub urgency: Urgency,
    pub hospital: String,
    pub location: Location,
    pub contact_name: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BloodRequest {
    /// A freshly submitted request; always starts `pending`.
    pub fn pending(
        id: RequestId,
        details: RequestDetails,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient_name: details.patient_name,
            blood_group: details.blood_group,
            units: details.units.get(),
            urgency: details.urgency,
            hospital: details.hospital,
            location: details.location,
            contact_name: details.contact_name,
            contact_phone: details.contact_phone,
            notes: details.notes,
            status: RequestStatus::Pending,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn submission() -> BloodRequestSubmission {
        BloodRequestSubmission {
            patient_name: "Ada Lovelace".to_owned(),
            blood_group: "O-".to_owned(),
            units: 2,
            urgency: "critical".to_owned(),
            hospital: "St. Mary's".to_owned(),
            location: "London".to_owned(),
            contact_name: "Charles".to_owned(),
            contact_phone: "+44 20 7946 0000".to_owned(),
            notes: Some("  ".to_owned()),
        }
    }

    #[rstest]
    fn valid_submission_produces_typed_details(submission: BloodRequestSubmission) {
        let details = submission.validate().expect("valid submission");
        assert_eq!(details.blood_group, BloodType::ONegative);
        assert_eq!(details.units.get(), 2);
        assert_eq!(details.urgency, Urgency::Critical);
        assert_eq!(details.notes, None);
    }

    #[rstest]
    fn collects_every_offending_field(mut submission: BloodRequestSubmission) {
        submission.units = 0;
        submission.blood_group = "Q+".to_owned();
        submission.contact_phone = " ".to_owned();

        let violations = submission.validate().expect_err("invalid submission");
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();

        assert_eq!(fields, vec!["bloodGroup", "units", "contactPhone"]);
    }

    #[rstest]
    fn empty_form_reports_all_required_fields() {
        let violations = BloodRequestSubmission::default()
            .validate()
            .expect_err("empty form");
        assert_eq!(violations.len(), 8);
    }

    #[rstest]
    #[case(Urgency::Low, Urgency::Medium)]
    #[case(Urgency::Medium, Urgency::High)]
    #[case(Urgency::High, Urgency::Critical)]
    fn urgency_orders_by_severity(#[case] lower: Urgency, #[case] higher: Urgency) {
        assert!(lower < higher);
    }

    #[rstest]
    #[case(RequestTransition::Approve, RequestStatus::Pending, true)]
    #[case(RequestTransition::Approve, RequestStatus::Approved, false)]
    #[case(RequestTransition::Reject, RequestStatus::Pending, true)]
    #[case(RequestTransition::Reject, RequestStatus::Approved, false)]
    #[case(RequestTransition::Fulfil, RequestStatus::Approved, true)]
    #[case(RequestTransition::Fulfil, RequestStatus::Pending, false)]
    #[case(RequestTransition::Fulfil, RequestStatus::Fulfilled, false)]
    #[case(RequestTransition::Approve, RequestStatus::Rejected, false)]
    fn transitions_only_apply_from_their_source(
        #[case] transition: RequestTransition,
        #[case] status: RequestStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(transition.source() == status, expected);
    }
}
