//! Upstream connection loop shared by every subscriber of one filter.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, trace, warn};

use super::{ChangeFeedConfig, FeedNotice};
use crate::domain::TableFilter;
use crate::domain::ports::ChangeSource;

pub(super) struct Pump {
    pub source: Arc<dyn ChangeSource>,
    pub filter: TableFilter,
    pub notices: broadcast::Sender<FeedNotice>,
    pub ready: watch::Sender<bool>,
    pub config: ChangeFeedConfig,
}

impl Pump {
    /// Forward upstream changes until aborted or until reconnection is
    /// abandoned.
    ///
    /// After a dropped connection the pump waits `reconnect_backoff` between
    /// attempts and gives up after `max_reconnect_attempts` consecutive
    /// failures, announcing [`FeedNotice::Lost`]. A successful reconnect is
    /// announced with [`FeedNotice::Reconnected`] because changes committed
    /// while disconnected were not delivered.
    pub async fn run(self) {
        let mut connected_once = false;
        let mut attempts = 0_u32;

        loop {
            match self.source.connect(&self.filter).await {
                Ok(mut stream) => {
                    if connected_once {
                        info!(filter = %self.filter, attempts, "change feed reconnected");
                        self.announce(FeedNotice::Reconnected);
                    }
                    connected_once = true;
                    attempts = 0;
                    self.ready.send_replace(true);

                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(event) if self.filter.matches(&event) => {
                                self.announce(FeedNotice::Change(event));
                            }
                            Ok(_) => {}
                            Err(err) => {
                                warn!(filter = %self.filter, error = %err, "change feed interrupted");
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        filter = %self.filter,
                        attempt = attempts,
                        error = %err,
                        "change feed connection failed"
                    );
                    self.ready.send_replace(true);
                }
            }

            if attempts >= self.config.max_reconnect_attempts {
                error!(
                    filter = %self.filter,
                    attempts,
                    "change feed lost; relying on polling"
                );
                self.announce(FeedNotice::Lost);
                return;
            }
            attempts += 1;
            tokio::time::sleep(self.config.reconnect_backoff).await;
        }
    }

    /// Broadcast to current subscribers. With none attached the notice is
    /// dropped; the channel is torn down once the last subscriber leaves.
    fn announce(&self, notice: FeedNotice) {
        if self.notices.send(notice).is_err() {
            trace!(filter = %self.filter, "no subscribers for change feed notice");
        }
    }
}
