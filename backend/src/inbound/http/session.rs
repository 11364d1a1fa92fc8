//! Caller identity extractor.
//!
//! The Auth collaborator authenticates callers upstream and forwards the
//! result as two headers. Handlers take [`SessionContext`] and receive a
//! domain [`Session`]; a missing or malformed header is `401 Unauthorized`.

use std::future::{Ready, ready};

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use tracing::debug;

use crate::domain::{Error, Role, Session, UserId};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Authenticated caller for the current request.
#[derive(Debug, Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn into_inner(self) -> Session {
        self.0
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, Error> {
    headers
        .get(name)
        .ok_or_else(|| Error::unauthorized(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| Error::unauthorized(format!("{name} header is not valid text")))
}

pub(crate) fn session_from_headers(headers: &HeaderMap) -> Result<Session, Error> {
    let raw_user = header(headers, USER_ID_HEADER)?;
    let user_id = UserId::new(raw_user).map_err(|err| {
        debug!(error = %err, "rejected caller identity");
        Error::unauthorized(format!("{USER_ID_HEADER} header is not a valid user id"))
    })?;
    let role: Role = header(headers, USER_ROLE_HEADER)?
        .parse()
        .map_err(|_| Error::unauthorized(format!("{USER_ROLE_HEADER} header names no known role")))?;
    Ok(Session::new(user_id, role))
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            session_from_headers(req.headers())
                .map(SessionContext)
                .map_err(actix_web::Error::from),
        )
    }
}
