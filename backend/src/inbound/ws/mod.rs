//! WebSocket inbound adapter streaming committed changes to clients.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - turn query parameters into a change-feed filter or a live match query
//! - hand the upgraded connection to a push-only session loop
//!
//! ```text
//! GET /ws/changes?table=blood_inventory&column=hospital_id&value=<uuid>
//! GET /ws/matches?bloodType=O-&location=Springfield
//! ```

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::domain::{Error, LiveQuery, Table, TableFilter};
use crate::inbound::http::validation::{invalid_field, parse_blood_type, require_location};

mod session;

pub mod messages;
pub mod origin;
pub mod state;

use session::PushSource;
use state::WsState;

#[derive(Debug, Default, Deserialize)]
pub struct ChangeStreamParams {
    pub table: Option<String>,
    pub column: Option<String>,
    pub value: Option<String>,
}

impl ChangeStreamParams {
    fn into_filter(self) -> Result<TableFilter, Error> {
        let raw_table = self
            .table
            .ok_or_else(|| invalid_field("table", "required", "table is required"))?;
        let table: Table = raw_table.parse().map_err(|_| {
            invalid_field("table", "unknown_table", format!("unknown table {raw_table}"))
        })?;
        let filter = TableFilter::table(table);
        match (self.column, self.value) {
            (None, None) => Ok(filter),
            (Some(column), Some(value)) if !column.trim().is_empty() => {
                Ok(filter.with_column(column.trim(), value))
            }
            (Some(_), Some(_)) => Err(invalid_field(
                "column",
                "required",
                "column must not be blank",
            )),
            (Some(_), None) => Err(invalid_field(
                "value",
                "required",
                "value is required when column is set",
            )),
            (None, Some(_)) => Err(invalid_field(
                "column",
                "required",
                "column is required when value is set",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStreamParams {
    pub blood_type: Option<String>,
    pub location: Option<String>,
}

/// Stream change events for one table, optionally narrowed by column.
#[get("/ws/changes")]
pub async fn ws_changes(
    state: web::Data<WsState>,
    query: web::Query<ChangeStreamParams>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    validate_origin_headers(&state, &req)?;
    let filter = query.into_inner().into_filter()?;

    let subscription = state.feed.subscribe(filter).await;
    info!(filter = %subscription.filter(), "WebSocket change stream opened");
    upgrade(PushSource::Feed(subscription), &req, stream)
}

/// Stream a donor's match list, refreshed whenever blood requests change.
#[get("/ws/matches")]
pub async fn ws_matches(
    state: web::Data<WsState>,
    query: web::Query<MatchStreamParams>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    validate_origin_headers(&state, &req)?;
    let MatchStreamParams {
        blood_type,
        location,
    } = query.into_inner();
    let raw_type =
        blood_type.ok_or_else(|| invalid_field("bloodType", "required", "bloodType is required"))?;
    let blood_type = parse_blood_type(&raw_type, "bloodType")?;
    let location = require_location(location, "location")?;

    let matches = state.matches.clone();
    let live = LiveQuery::start(
        &state.feed,
        vec![TableFilter::table(Table::BloodRequests)],
        move || {
            let matches = matches.clone();
            let location = location.clone();
            async move { matches.find_matches(blood_type, &location).await }
        },
    )
    .await;
    info!(blood_type = %blood_type, "WebSocket match stream opened");
    upgrade(PushSource::matches(live), &req, stream)
}

fn upgrade(source: PushSource, req: &HttpRequest, stream: Payload) -> actix_web::Result<HttpResponse> {
    let (response, session, messages) = actix_ws::handle(req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    actix_web::rt::spawn(session::handle_ws_session(source, session, messages));
    Ok(response)
}

fn validate_origin_headers(state: &WsState, req: &HttpRequest) -> actix_web::Result<()> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(state, origin_header)
}

fn validate_origin(state: &WsState, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if state.origins.is_allowed(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

/// Register the WebSocket endpoints.
pub fn configure_ws(cfg: &mut web::ServiceConfig) {
    cfg.service(ws_changes).service(ws_matches);
}
