//! Backend entry-point: loads settings, wires storage, and serves the API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bloodlink::AppSettings;
use bloodlink::inbound::http::health::HealthState;
use bloodlink::inbound::ws::origin::OriginAllowList;
use bloodlink::outbound::persistence::DbPool;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| {
        std::io::Error::other(format!("failed to load settings: {e}"))
    })?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let feed = settings
        .change_feed_config()
        .map_err(std::io::Error::other)?;
    let origins =
        OriginAllowList::parse(&settings.allowed_origins()).map_err(std::io::Error::other)?;
    if origins.is_empty() {
        warn!("no allowed origins configured; WebSocket upgrades will be refused");
    }

    let mut config = ServerConfig::new(bind_addr, origins).with_change_feed(feed);
    if let Some(pool_config) = settings.pool_config() {
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("no database URL configured; state is kept in memory");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "bloodlink listening");
    server.await
}
