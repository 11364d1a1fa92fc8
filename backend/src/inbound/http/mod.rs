//! HTTP inbound adapter exposing the coordination endpoints.
//!
//! Handlers parse transport input, call a driving port from [`state`], and
//! return domain values as JSON. Identity arrives through
//! [`session::SessionContext`].

pub mod availability;
pub mod error;
pub mod health;
pub mod inventory;
pub mod matches;
pub mod requests;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(requests::submit_request)
        .service(requests::list_requests)
        .service(requests::get_request)
        .service(requests::approve_request)
        .service(requests::reject_request)
        .service(requests::fulfil_request)
        .service(inventory::add_inventory)
        .service(inventory::remove_inventory)
        .service(inventory::list_inventory)
        .service(inventory::inventory_units)
        .service(inventory::inventory_totals)
        .service(matches::find_matches)
        .service(matches::donor_matches)
        .service(availability::availability_overview)
        .service(availability::availability_for_type);
}
