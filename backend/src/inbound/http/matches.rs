//! Donor match handlers.
//!
//! ```text
//! GET /api/v1/matches?bloodType=O-&location=Springfield
//! GET /api/v1/donors/{id}/matches
//! ```

use actix_web::{get, web};
use serde::Deserialize;

use crate::domain::DonorId;
use crate::domain::ports::MatchResult;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field, parse_blood_type, parse_id, require_location};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQueryParams {
    pub blood_type: Option<String>,
    pub location: Option<String>,
}

#[get("/matches")]
pub async fn find_matches(
    state: web::Data<HttpState>,
    _session: SessionContext,
    query: web::Query<MatchQueryParams>,
) -> ApiResult<web::Json<MatchResult>> {
    let MatchQueryParams {
        blood_type,
        location,
    } = query.into_inner();
    let raw_type =
        blood_type.ok_or_else(|| invalid_field("bloodType", "required", "bloodType is required"))?;
    let blood_type = parse_blood_type(&raw_type, "bloodType")?;
    let location = require_location(location, "location")?;
    Ok(web::Json(
        state.matches.find_matches(blood_type, &location).await?,
    ))
}

#[get("/donors/{id}/matches")]
pub async fn donor_matches(
    state: web::Data<HttpState>,
    _session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MatchResult>> {
    let donor_id: DonorId = parse_id(&path, "donorId")?;
    Ok(web::Json(state.matches.matches_for_donor(&donor_id).await?))
}
