//! Queries kept fresh by the change feed with a polling backstop.

use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, SelectAll};
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{ChangeFeed, FeedNotice, Subscription};
use crate::domain::{Error, TableFilter};

/// Why a live query re-ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    /// A matching change event arrived.
    Change,
    /// The feed reconnected or this subscriber lagged; events may be missing.
    Resync,
    /// The polling interval elapsed.
    Poll,
}

/// One published result. `revision` increases by one per refresh.
#[derive(Debug, Clone)]
pub struct LiveSnapshot<T> {
    pub revision: u64,
    pub trigger: RefreshTrigger,
    pub result: Result<T, Error>,
}

type SnapshotSender<T> = watch::Sender<Option<LiveSnapshot<T>>>;

/// A query re-run on every matching change, every resync, and every poll
/// tick. Dropping it cancels the refresh task, its timer, and its
/// subscriptions.
pub struct LiveQuery<T> {
    results: watch::Receiver<Option<LiveSnapshot<T>>>,
    task: JoinHandle<()>,
}

fn notices_of(subscription: Subscription) -> BoxStream<'static, FeedNotice> {
    stream::unfold(subscription, |mut subscription| async move {
        subscription
            .recv()
            .await
            .map(|notice| (notice, subscription))
    })
    .boxed()
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Subscribe to `filters`, run `query` once, and keep re-running it.
    pub async fn start<F, Fut>(feed: &ChangeFeed, filters: Vec<TableFilter>, query: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let mut notices = SelectAll::new();
        for filter in filters {
            notices.push(notices_of(feed.subscribe(filter).await));
        }
        let (sender, results) = watch::channel(None);
        let task = tokio::spawn(refresh_loop(
            query,
            notices,
            feed.config().poll_interval,
            sender,
        ));
        Self { results, task }
    }

    /// The most recent snapshot, if the first run has completed.
    pub fn latest(&self) -> Option<LiveSnapshot<T>> {
        self.results.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<Option<LiveSnapshot<T>>> {
        self.results.clone()
    }

    /// Wait until a snapshot with at least `revision` has been published.
    pub async fn wait_for_revision(&mut self, revision: u64) -> Option<LiveSnapshot<T>> {
        self.results
            .wait_for(|snapshot| {
                snapshot
                    .as_ref()
                    .is_some_and(|snapshot| snapshot.revision >= revision)
            })
            .await
            .ok()
            .and_then(|snapshot| (*snapshot).clone())
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn refresh_loop<T, F, Fut>(
    query: F,
    mut notices: SelectAll<BoxStream<'static, FeedNotice>>,
    poll_interval: Duration,
    results: SnapshotSender<T>,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut feed_open = !notices.is_empty();
    let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut revision = 0_u64;
    let mut trigger = RefreshTrigger::Initial;

    loop {
        let result = query().await;
        if let Err(err) = &result {
            warn!(revision, error = %err, "live query refresh failed");
        }
        results.send_replace(Some(LiveSnapshot {
            revision,
            trigger,
            result,
        }));
        revision += 1;

        trigger = loop {
            tokio::select! {
                notice = notices.next(), if feed_open => match notice {
                    Some(FeedNotice::Change(_)) => break RefreshTrigger::Change,
                    Some(FeedNotice::Reconnected | FeedNotice::Lagged { .. }) => {
                        break RefreshTrigger::Resync;
                    }
                    Some(FeedNotice::Lost) => {
                        warn!("live query lost its change feed; polling only");
                    }
                    None => {
                        debug!("live query notices closed");
                        feed_open = false;
                    }
                },
                _ = ticker.tick() => break RefreshTrigger::Poll,
            }
        };
    }
}
