//! Parsing helpers for path and query parameters.
//!
//! Failures use the same `invalid_request` shape as domain validation so
//! clients see one format for every offending field.

use std::str::FromStr;

use crate::domain::{BloodType, Error, FieldViolation, Location};

pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::validation(vec![FieldViolation::new(field, code, message)])
}

/// Parse an identifier path segment.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| invalid_field(field, "invalid_uuid", format!("{field} must be a valid UUID")))
}

pub(crate) fn parse_blood_type(raw: &str, field: &str) -> Result<BloodType, Error> {
    raw.parse().map_err(|_| {
        invalid_field(
            field,
            "invalid_blood_type",
            format!("{field} must be one of A+, A-, B+, B-, AB+, AB-, O+, O-"),
        )
    })
}

pub(crate) fn require_location(raw: Option<String>, field: &str) -> Result<Location, Error> {
    let location = Location::new(raw.unwrap_or_default());
    if location.is_blank() {
        return Err(invalid_field(
            field,
            "required",
            format!("{field} must not be empty"),
        ));
    }
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, RequestId};
    use rstest::rstest;

    #[rstest]
    fn malformed_ids_name_the_field() {
        let err = parse_id::<RequestId>("not-a-uuid", "requestId").expect_err("invalid");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.violated_fields(), vec!["requestId".to_owned()]);
    }

    #[rstest]
    #[case(" ab- ", BloodType::AbNegative)]
    #[case("O+", BloodType::OPositive)]
    fn blood_types_parse_leniently(#[case] raw: &str, #[case] expected: BloodType) {
        assert_eq!(parse_blood_type(raw, "bloodType").expect("valid"), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   ".to_owned()))]
    fn blank_locations_are_rejected(#[case] raw: Option<String>) {
        let err = require_location(raw, "location").expect_err("blank");
        assert_eq!(err.violated_fields(), vec!["location".to_owned()]);
    }
}
