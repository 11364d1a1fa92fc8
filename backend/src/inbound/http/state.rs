//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AvailabilityQuery, BloodRequestCommand, BloodRequestQuery, InventoryCommand, InventoryQuery,
    MatchQuery,
};

/// Ports shared by the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub requests: Arc<dyn BloodRequestCommand>,
    pub requests_query: Arc<dyn BloodRequestQuery>,
    pub inventory: Arc<dyn InventoryCommand>,
    pub inventory_query: Arc<dyn InventoryQuery>,
    pub matches: Arc<dyn MatchQuery>,
    pub availability: Arc<dyn AvailabilityQuery>,
}
