//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use bloodlink::domain::ChangeFeedConfig;
use bloodlink::inbound::ws::origin::OriginAllowList;
use bloodlink::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) feed: ChangeFeedConfig,
    pub(crate) origins: OriginAllowList,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, origins: OriginAllowList) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            feed: ChangeFeedConfig::default(),
            origins,
        }
    }

    /// Attach a database connection pool. Without one the server keeps its
    /// state in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_change_feed(mut self, feed: ChangeFeedConfig) -> Self {
        self.feed = feed;
        self
    }
}
