//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::test::TestRequest;

use crate::domain::ports::{
    MockAvailabilityQuery, MockBloodRequestCommand, MockBloodRequestQuery, MockInventoryCommand,
    MockInventoryQuery, MockMatchQuery,
};
use crate::domain::{Role, Session, UserId};
use crate::inbound::http::session::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::inbound::http::state::HttpState;

pub const CALLER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// One mock per driving port. Unconfigured mocks panic when called.
#[derive(Default)]
pub struct MockPorts {
    pub requests: MockBloodRequestCommand,
    pub requests_query: MockBloodRequestQuery,
    pub inventory: MockInventoryCommand,
    pub inventory_query: MockInventoryQuery,
    pub matches: MockMatchQuery,
    pub availability: MockAvailabilityQuery,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            requests: Arc::new(self.requests),
            requests_query: Arc::new(self.requests_query),
            inventory: Arc::new(self.inventory),
            inventory_query: Arc::new(self.inventory_query),
            matches: Arc::new(self.matches),
            availability: Arc::new(self.availability),
        }
    }
}

pub fn caller(role: Role) -> Session {
    Session::new(UserId::new(CALLER_ID).expect("fixture user id"), role)
}

/// Attach identity headers for `role`.
pub fn as_role(request: TestRequest, role: Role) -> TestRequest {
    request
        .insert_header((USER_ID_HEADER, CALLER_ID))
        .insert_header((USER_ROLE_HEADER, role.as_str()))
}
