//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use bloodlink::domain::ChangeFeed;
use bloodlink::inbound::http::configure_api;
use bloodlink::inbound::http::health::{HealthState, live, ready};
use bloodlink::inbound::http::state::HttpState;
use bloodlink::inbound::ws::configure_ws;
use bloodlink::inbound::ws::state::WsState;
use bloodlink::middleware::RequestLog;
use bloodlink::outbound::change_hub::ChangeHub;
use state_builders::build_adapter_ports;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(RequestLog)
        .service(web::scope("/api/v1").configure(configure_api))
        .configure(configure_ws)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        db_pool,
        feed,
        origins,
    } = config;

    let hub = ChangeHub::default();
    info!(
        storage = if db_pool.is_some() { "postgres" } else { "memory" },
        "wiring coordination services"
    );
    let ports = build_adapter_ports(db_pool.as_ref(), &hub);
    let change_feed = ChangeFeed::new(Arc::new(hub), feed);

    let http_state = web::Data::new(ports.http);
    let ws_state = web::Data::new(WsState::new(change_feed, ports.matches, origins));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use bloodlink::inbound::ws::origin::OriginAllowList;
    use rstest::rstest;

    fn dependencies() -> AppDependencies {
        let hub = ChangeHub::default();
        let ports = build_adapter_ports(None, &hub);
        let feed = ChangeFeed::new(Arc::new(hub), Default::default());
        let origins = OriginAllowList::parse(&["http://localhost:3000"]).expect("origins");
        let health = HealthState::new();
        health.mark_ready();
        AppDependencies {
            health_state: web::Data::new(health),
            http_state: web::Data::new(ports.http),
            ws_state: web::Data::new(WsState::new(feed, ports.matches, origins)),
        }
    }

    #[rstest]
    #[case("/health/ready", None, StatusCode::OK)]
    #[case("/health/live", None, StatusCode::OK)]
    #[case("/api/v1/inventory/totals", None, StatusCode::UNAUTHORIZED)]
    #[case(
        "/api/v1/inventory/totals",
        Some("00000000-0000-0000-0000-000000000001"),
        StatusCode::OK
    )]
    #[actix_web::test]
    async fn routes_are_mounted(
        #[case] uri: &str,
        #[case] user: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let app = actix_test::init_service(build_app(dependencies())).await;
        let mut request = actix_test::TestRequest::get().uri(uri);
        if let Some(user) = user {
            request = request
                .insert_header(("X-User-Id", user))
                .insert_header(("X-User-Role", "donor"));
        }
        let response = actix_test::call_service(&app, request.to_request()).await;

        assert_eq!(response.status(), expected);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
