//! In-process broadcaster of committed changes.
//!
//! Stores publish here after each committed mutation; the hub serves as the
//! [`ChangeSource`] the change feed connects to. Publishing with no
//! connected listener is a no-op.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace};

use crate::domain::ports::{ChangeSource, ChangeSourceError, ChangeStream};
use crate::domain::{ChangeEvent, TableFilter};

/// Default number of buffered events per listener.
pub const DEFAULT_HUB_CAPACITY: usize = 1024;

/// Broadcast point shared by the stores and the change feed.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

impl ChangeHub {
    /// Hub buffering up to `capacity` events per listener.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a committed change to every connected listener.
    pub fn publish(&self, event: ChangeEvent) {
        trace!(
            table = %event.table,
            operation = event.operation.as_str(),
            "publishing change"
        );
        if self.sender.send(event).is_err() {
            trace!("no change feed listeners attached");
        }
    }

    /// Number of attached change feed pumps.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ChangeSource for ChangeHub {
    async fn connect(&self, filter: &TableFilter) -> Result<ChangeStream, ChangeSourceError> {
        let receiver = self.sender.subscribe();
        let owned_filter = filter.clone();
        debug!(filter = %filter, "change hub listener attached");
        let changes = stream::unfold(Some(receiver), move |state| {
            let item_filter = owned_filter.clone();
            async move {
                let mut receiver = state?;
                loop {
                    match receiver.recv().await {
                        Ok(event) if item_filter.matches(&event) => {
                            return Some((Ok(event), Some(receiver)));
                        }
                        Ok(_) => {}
                        // A lagging listener has lost events; end this
                        // connection so the feed reconnects and resyncs.
                        Err(RecvError::Lagged(skipped)) => {
                            return Some((
                                Err(ChangeSourceError::transport(format!(
                                    "listener lagged by {skipped} events"
                                ))),
                                None,
                            ));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(changes.boxed())
    }
}
