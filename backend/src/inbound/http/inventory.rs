//! Inventory ledger handlers.
//!
//! ```text
//! POST /api/v1/hospitals/{id}/inventory/add     {"bloodType":"O-","units":4}
//! POST /api/v1/hospitals/{id}/inventory/remove  {"bloodType":"O-","units":1}
//! GET  /api/v1/hospitals/{id}/inventory
//! GET  /api/v1/hospitals/{id}/inventory/{bloodType}
//! GET  /api/v1/inventory/totals
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::InventoryAdjustment;
use crate::domain::{BloodType, HospitalId, InventoryKey, InventoryRecord, InventoryTotal};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field, parse_blood_type, parse_id};

/// Body of an add or remove call. `units` is signed so that zero and
/// negative counts reach validation instead of failing deserialisation.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentBody {
    pub blood_type: Option<String>,
    pub units: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsResponse {
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units: u32,
}

fn parse_adjustment(hospital_id: HospitalId, body: AdjustmentBody) -> ApiResult<InventoryAdjustment> {
    let raw_type = body
        .blood_type
        .ok_or_else(|| invalid_field("bloodType", "required", "bloodType is required"))?;
    let blood_type = parse_blood_type(&raw_type, "bloodType")?;
    let units = body
        .units
        .ok_or_else(|| invalid_field("units", "required", "units is required"))?;
    Ok(InventoryAdjustment {
        hospital_id,
        blood_type,
        units,
    })
}

#[post("/hospitals/{id}/inventory/add")]
pub async fn add_inventory(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AdjustmentBody>,
) -> ApiResult<web::Json<InventoryRecord>> {
    let hospital_id: HospitalId = parse_id(&path, "hospitalId")?;
    let adjustment = parse_adjustment(hospital_id, payload.into_inner())?;
    Ok(web::Json(
        state.inventory.add_units(session.session(), adjustment).await?,
    ))
}

#[post("/hospitals/{id}/inventory/remove")]
pub async fn remove_inventory(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AdjustmentBody>,
) -> ApiResult<web::Json<InventoryRecord>> {
    let hospital_id: HospitalId = parse_id(&path, "hospitalId")?;
    let adjustment = parse_adjustment(hospital_id, payload.into_inner())?;
    Ok(web::Json(
        state
            .inventory
            .remove_units(session.session(), adjustment)
            .await?,
    ))
}

#[get("/hospitals/{id}/inventory")]
pub async fn list_inventory(
    state: web::Data<HttpState>,
    _session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<InventoryRecord>>> {
    let hospital_id: HospitalId = parse_id(&path, "hospitalId")?;
    Ok(web::Json(
        state.inventory_query.list_for_hospital(&hospital_id).await?,
    ))
}

#[get("/hospitals/{id}/inventory/{blood_type}")]
pub async fn inventory_units(
    state: web::Data<HttpState>,
    _session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<UnitsResponse>> {
    let (raw_hospital, raw_type) = path.into_inner();
    let hospital_id: HospitalId = parse_id(&raw_hospital, "hospitalId")?;
    let blood_type = parse_blood_type(&raw_type, "bloodType")?;
    let units = state
        .inventory_query
        .units(&InventoryKey::new(hospital_id, blood_type))
        .await?;
    Ok(web::Json(UnitsResponse {
        hospital_id,
        blood_type,
        units,
    }))
}

#[get("/inventory/totals")]
pub async fn inventory_totals(
    state: web::Data<HttpState>,
    _session: SessionContext,
) -> ApiResult<web::Json<Vec<InventoryTotal>>> {
    Ok(web::Json(state.inventory_query.totals_by_blood_type().await?))
}
