//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use rstest::rstest;
use serde_json::{Value, json};

async fn body_of(error: &Error) -> Value {
    let response = ResponseError::error_response(error);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no identity"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::invalid_transition("already approved"), StatusCode::CONFLICT)]
#[case(Error::insufficient_stock("only 2 on hand"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("store down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted() {
    let error = Error::internal("pool exhausted at 10.0.0.3").with_details(json!({"host": "db"}));

    let body = body_of(&error).await;

    assert_eq!(
        body,
        json!({"code": "internal_error", "message": "Internal server error"})
    );
}

#[rstest]
#[actix_web::test]
async fn conflict_details_reach_the_client() {
    let error = Error::insufficient_stock("not enough O- units")
        .with_details(json!({"requested": 5, "available": 3}));

    let body = body_of(&error).await;

    insta::assert_json_snapshot!(body, @r#"
    {
      "code": "insufficient_stock",
      "details": {
        "available": 3,
        "requested": 5
      },
      "message": "not enough O- units"
    }
    "#);
}
