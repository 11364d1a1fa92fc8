//! Tests for domain error construction and serialization.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::invalid_transition("terminal"), ErrorCode::InvalidTransition)]
#[case(Error::insufficient_stock("short"), ErrorCode::InsufficientStock)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("no"), ErrorCode::Forbidden)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn validation_lists_every_field() {
    let error = Error::validation(vec![
        FieldViolation::new("units", "must_be_positive", "units must be at least 1"),
        FieldViolation::new("bloodGroup", "unknown_blood_type", "unknown blood type"),
    ]);

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), "invalid fields: units, bloodGroup");
    assert_eq!(
        error.violated_fields(),
        vec!["units".to_owned(), "bloodGroup".to_owned()]
    );
}

#[rstest]
fn violated_fields_is_empty_without_details() {
    assert!(Error::not_found("missing").violated_fields().is_empty());
}

#[rstest]
fn serializes_with_snake_case_code() {
    let error = Error::insufficient_stock("only 3 units available")
        .with_details(json!({ "available": 3 }));

    let value = serde_json::to_value(&error).expect("error serializes");

    assert_eq!(
        value,
        json!({
            "code": "insufficient_stock",
            "message": "only 3 units available",
            "details": { "available": 3 }
        })
    );
}

#[rstest]
fn omits_absent_details() {
    let value = serde_json::to_value(Error::forbidden("nope")).expect("error serializes");
    assert!(value.get("details").is_none());
}
