//! Availability signal handlers.
//!
//! ```text
//! GET /api/v1/availability
//! GET /api/v1/availability/{bloodType}
//! ```
//!
//! The signal reflects request pressure, not units on hand; see
//! `/api/v1/inventory/totals` for stock.

use actix_web::{get, web};

use crate::domain::ports::BloodTypeAvailability;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_blood_type;

#[get("/availability")]
pub async fn availability_overview(
    state: web::Data<HttpState>,
    _session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodTypeAvailability>>> {
    Ok(web::Json(state.availability.overview().await?))
}

#[get("/availability/{blood_type}")]
pub async fn availability_for_type(
    state: web::Data<HttpState>,
    _session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BloodTypeAvailability>> {
    let blood_type = parse_blood_type(&path, "bloodType")?;
    Ok(web::Json(state.availability.availability(blood_type).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, BloodType, Error, Role};
    use crate::inbound::http::test_utils::{MockPorts, as_role};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    async fn call(ports: MockPorts, uri: &str) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new().app_data(web::Data::new(ports.into_state())).service(
                web::scope("/api/v1")
                    .service(availability_overview)
                    .service(availability_for_type),
            ),
        )
        .await;
        let request =
            as_role(actix_test::TestRequest::get().uri(uri), Role::Recipient).to_request();
        let response = actix_test::call_service(&app, request).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[rstest]
    #[actix_web::test]
    async fn single_type_signal_is_serialised() {
        let mut ports = MockPorts::default();
        ports
            .availability
            .expect_availability()
            .withf(|blood_type| *blood_type == BloodType::BNegative)
            .times(1)
            .return_once(|blood_type| {
                Ok(BloodTypeAvailability {
                    blood_type,
                    availability: Availability::Medium,
                    pending: 2,
                    total: 5,
                })
            });

        let (status, body) = call(ports, "/api/v1/availability/b-").await;

        assert_eq!(status, StatusCode::OK);
        insta::assert_json_snapshot!(body, @r#"
        {
          "availability": "medium",
          "bloodType": "B-",
          "pending": 2,
          "total": 5
        }
        "#);
    }

    #[rstest]
    #[actix_web::test]
    async fn store_outages_are_service_unavailable() {
        let mut ports = MockPorts::default();
        ports
            .availability
            .expect_overview()
            .return_once(|| Err(Error::service_unavailable("request store unavailable")));

        let (status, body) = call(ports, "/api/v1/availability").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "service_unavailable");
    }
}
