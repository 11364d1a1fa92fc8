//! Blood request handlers.
//!
//! ```text
//! POST /api/v1/requests
//! GET  /api/v1/requests?status=pending&mine=true
//! GET  /api/v1/requests/{id}
//! POST /api/v1/requests/{id}/approve
//! POST /api/v1/requests/{id}/reject
//! POST /api/v1/requests/{id}/fulfil
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::info;

use crate::domain::{BloodRequest, BloodRequestSubmission, RequestId, RequestStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field, parse_id};

#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    /// Restrict to requests created by the caller.
    #[serde(default)]
    pub mine: bool,
}

fn parse_status(raw: Option<String>) -> ApiResult<Option<RequestStatus>> {
    raw.map(|value| {
        value.parse::<RequestStatus>().map_err(|_| {
            invalid_field(
                "status",
                "invalid_status",
                "status must be pending, approved, rejected, or fulfilled",
            )
        })
    })
    .transpose()
}

#[post("/requests")]
pub async fn submit_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BloodRequestSubmission>,
) -> ApiResult<HttpResponse> {
    let created = state
        .requests
        .submit(session.session(), payload.into_inner())
        .await?;
    info!(request_id = %created.id, "blood request accepted over HTTP");
    Ok(HttpResponse::Created().json(created))
}

#[get("/requests")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListRequestsQuery>,
) -> ApiResult<web::Json<Vec<BloodRequest>>> {
    let ListRequestsQuery { status, mine } = query.into_inner();
    let status = parse_status(status)?;
    let requests = if mine {
        let mut own = state
            .requests_query
            .list_for_user(session.session().user_id())
            .await?;
        own.retain(|request| status.is_none_or(|wanted| request.status == wanted));
        own
    } else {
        state.requests_query.list(status).await?
    };
    Ok(web::Json(requests))
}

#[get("/requests/{id}")]
pub async fn get_request(
    state: web::Data<HttpState>,
    _session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BloodRequest>> {
    let id: RequestId = parse_id(&path, "requestId")?;
    Ok(web::Json(state.requests_query.get(&id).await?))
}

#[post("/requests/{id}/approve")]
pub async fn approve_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BloodRequest>> {
    let id: RequestId = parse_id(&path, "requestId")?;
    Ok(web::Json(state.requests.approve(session.session(), &id).await?))
}

#[post("/requests/{id}/reject")]
pub async fn reject_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BloodRequest>> {
    let id: RequestId = parse_id(&path, "requestId")?;
    Ok(web::Json(state.requests.reject(session.session(), &id).await?))
}

#[post("/requests/{id}/fulfil")]
pub async fn fulfil_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BloodRequest>> {
    let id: RequestId = parse_id(&path, "requestId")?;
    Ok(web::Json(state.requests.fulfil(session.session(), &id).await?))
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
