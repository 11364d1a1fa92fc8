//! Port for the storage-level change notification channel.
//!
//! The change feed opens one upstream stream per subscription key. A stream
//! that yields an error or ends is treated as a dropped connection.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{ChangeEvent, TableFilter};

use super::define_port_error;

define_port_error! {
    /// Errors raised by change source adapters.
    pub enum ChangeSourceError {
        /// The channel could not be opened or was interrupted.
        Transport { message } =>
            "change source transport failed: {message}",
    }
}

/// Stream of committed changes matching one filter, in commit order.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, ChangeSourceError>>;

/// Upstream of committed changes feeding the change feed.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    async fn connect(&self, filter: &TableFilter) -> Result<ChangeStream, ChangeSourceError>;
}
