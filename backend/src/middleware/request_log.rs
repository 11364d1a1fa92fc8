//! Request-scoped identifiers and completion logging.
//!
//! Every request runs inside a `request` span carrying a UUID `request_id`.
//! A valid `X-Request-Id` header from the caller is reused; otherwise a
//! fresh id is generated. The id is echoed on the response and readable from
//! handlers through [`RequestId::current`].
//!
//! Task-locals do not follow spawned tasks. Wrap spawned work in
//! [`RequestId::scope`] to keep the id.

use std::future::Future;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

task_local! {
    static REQUEST_ID: RequestId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(Uuid);

impl RequestId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    fn from_request(req: &ServiceRequest) -> Self {
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// The id of the request being served, if any.
    pub fn current() -> Option<Self> {
        REQUEST_ID.try_with(|id| *id).ok()
    }

    pub async fn scope<Fut: Future>(id: Self, fut: Fut) -> Fut::Output {
        REQUEST_ID.scope(id, fut).await
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Middleware assigning request ids and logging each completed request.
///
/// ```
/// use actix_web::App;
/// use bloodlink::middleware::RequestLog;
///
/// let _app = App::new().wrap(RequestLog);
/// ```
#[derive(Clone)]
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddleware { service }))
    }
}

pub struct RequestLogMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = RequestId::from_request(&req);
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );
        let started = Instant::now();
        let fut = span.in_scope(|| self.service.call(req));

        Box::pin(
            RequestId::scope(request_id, async move {
                let mut res = fut.await?;
                let status = res.status();
                info!(
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                match HeaderValue::from_str(&request_id.to_string()) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }
                    Err(error) => warn!(%error, "failed to encode request id header"),
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    async fn echo_request_id() -> HttpResponse {
        let id = RequestId::current().map(|id| id.to_string()).unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let app = actix_test::init_service(
            App::new()
                .wrap(RequestLog)
                .route("/", web::get().to(echo_request_id)),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((REQUEST_ID_HEADER, value));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        let echoed = res
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("request id header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        let body = actix_test::read_body(res).await;
        (echoed, String::from_utf8(body.to_vec()).expect("utf8 body"))
    }

    #[rstest]
    #[actix_web::test]
    async fn handlers_see_the_echoed_id() {
        let (echoed, body) = call(None).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
        assert_eq!(echoed, body);
    }

    #[rstest]
    #[actix_web::test]
    async fn caller_ids_are_reused() {
        let supplied = Uuid::new_v4().to_string();
        let (echoed, _) = call(Some(&supplied)).await;
        assert_eq!(echoed, supplied);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_caller_ids_are_replaced() {
        let (echoed, _) = call(Some("not-a-uuid")).await;
        assert_ne!(echoed, "not-a-uuid");
        assert!(Uuid::parse_str(&echoed).is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn ids_are_absent_outside_requests() {
        assert!(RequestId::current().is_none());
        let id = RequestId::generate();
        assert_eq!(RequestId::scope(id, async { RequestId::current() }).await, Some(id));
    }
}
