//! Application settings loaded via OrthoConfig.
//!
//! Values come from `BLOODLINK_*` environment variables, the matching CLI
//! flags, or a configuration file. Every value is optional; the accessors
//! supply defaults.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ChangeFeedConfig;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;
const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Settings that parsed but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}")]
    BindAddr { value: String },
    #[error("poll interval must be at least one second")]
    PollInterval,
}

/// Runtime settings resolved by `ortho_config`.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BLOODLINK")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the server keeps all state in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Live query fallback refresh period, in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Pause between change feed reconnection attempts, in seconds.
    pub reconnect_backoff_secs: Option<u64>,
    /// Failed reconnection attempts before the feed is declared lost.
    pub reconnect_attempts: Option<u32>,
    /// Comma-separated origins allowed to open WebSocket connections.
    pub allowed_origins: Option<String>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.trim().parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    /// The database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url().map(|url| {
            PoolConfig::new(url)
                .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
        })
    }

    pub fn change_feed_config(&self) -> Result<ChangeFeedConfig, SettingsError> {
        let poll_secs = self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_secs == 0 {
            return Err(SettingsError::PollInterval);
        }
        Ok(ChangeFeedConfig {
            reconnect_backoff: Duration::from_secs(
                self.reconnect_backoff_secs
                    .unwrap_or(DEFAULT_RECONNECT_BACKOFF_SECS),
            ),
            max_reconnect_attempts: self
                .reconnect_attempts
                .unwrap_or(DEFAULT_RECONNECT_ATTEMPTS),
            poll_interval: Duration::from_secs(poll_secs),
            ..ChangeFeedConfig::default()
        })
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
