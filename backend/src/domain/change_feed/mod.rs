//! Change feed: fan-out of storage change notifications.
//!
//! Subscribers register interest in a [`TableFilter`]. Subscribers to the
//! same filter share one upstream connection to the [`ChangeSource`]; the
//! connection is opened by the first subscriber and torn down when the last
//! one leaves. Events for one filter are delivered in source commit order.
//! No ordering holds across filters.

mod live_query;
mod pump;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use self::live_query::{LiveQuery, LiveSnapshot, RefreshTrigger};
use self::pump::Pump;
use crate::domain::ports::ChangeSource;
use crate::domain::{ChangeEvent, TableFilter};

/// Tuning for the change feed and the live queries built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFeedConfig {
    /// Pause between reconnection attempts.
    pub reconnect_backoff: Duration,
    /// Consecutive failed attempts before the feed is declared lost.
    pub max_reconnect_attempts: u32,
    /// Fallback refresh period for live queries. Expected to lie within
    /// 10 to 30 seconds in production.
    pub poll_interval: Duration,
    /// Per-filter buffer; slower subscribers observe [`FeedNotice::Lagged`].
    pub channel_capacity: usize,
}

impl Default for ChangeFeedConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff: Duration::from_secs(5),
            max_reconnect_attempts: 5,
            poll_interval: Duration::from_secs(15),
            channel_capacity: 256,
        }
    }
}

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedNotice {
    /// A committed change matching the subscription filter.
    Change(ChangeEvent),
    /// The upstream connection was re-established; changes may have been
    /// missed and dependants should refetch.
    Reconnected,
    /// This subscriber fell behind and `skipped` notices were discarded.
    Lagged { skipped: u64 },
    /// Reconnection was abandoned; no further changes will arrive.
    Lost,
}

struct Channel {
    generation: u64,
    notices: broadcast::Sender<FeedNotice>,
    ready: watch::Receiver<bool>,
    subscribers: usize,
    pump: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    channels: Mutex<HashMap<TableFilter, Channel>>,
    generations: AtomicU64,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<TableFilter, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop one subscriber of the given channel generation. Subscribers of a
    /// channel that was already replaced after being lost are ignored.
    fn release(&self, filter: &TableFilter, generation: u64) {
        let mut channels = self.lock();
        let Some(channel) = channels
            .get_mut(filter)
            .filter(|channel| channel.generation == generation)
        else {
            return;
        };
        channel.subscribers = channel.subscribers.saturating_sub(1);
        if channel.subscribers == 0 {
            if let Some(channel) = channels.remove(filter) {
                channel.pump.abort();
                debug!(filter = %filter, "change feed channel closed");
            }
        }
    }
}

/// Subscription registry keyed by filter.
#[derive(Clone)]
pub struct ChangeFeed {
    source: Arc<dyn ChangeSource>,
    config: ChangeFeedConfig,
    registry: Arc<Registry>,
}

impl ChangeFeed {
    pub fn new(source: Arc<dyn ChangeSource>, config: ChangeFeedConfig) -> Self {
        Self {
            source,
            config,
            registry: Arc::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &ChangeFeedConfig {
        &self.config
    }

    /// Register interest in `filter`.
    ///
    /// Resolves once the shared upstream connection has made its first
    /// connection attempt, so changes committed after this returns are
    /// delivered unless the connection subsequently drops.
    pub async fn subscribe(&self, filter: TableFilter) -> Subscription {
        let (subscription, mut ready) = {
            let mut channels = self.registry.lock();
            let channel = match channels.entry(filter.clone()) {
                Entry::Occupied(mut entry) => {
                    if entry.get().pump.is_finished() {
                        entry.insert(self.open_channel(&filter));
                    }
                    entry.into_mut()
                }
                Entry::Vacant(entry) => entry.insert(self.open_channel(&filter)),
            };
            channel.subscribers += 1;
            // Built before the wait so that cancelling this future releases it.
            let subscription = Subscription {
                filter: filter.clone(),
                generation: channel.generation,
                receiver: channel.notices.subscribe(),
                registry: Arc::clone(&self.registry),
            };
            (subscription, channel.ready.clone())
        };
        if ready.wait_for(|connected| *connected).await.is_err() {
            debug!(filter = %filter, "change feed pump ended before first connection");
        }
        subscription
    }

    /// Release a subscription. Equivalent to dropping it.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Callback form of [`ChangeFeed::subscribe`].
    ///
    /// Once the returned handle is released or dropped, `on_notice` is never
    /// invoked again.
    pub async fn subscribe_with<F>(&self, filter: TableFilter, on_notice: F) -> CallbackHandle
    where
        F: FnMut(FeedNotice) + Send + 'static,
    {
        let mut subscription = self.subscribe(filter).await;
        let boxed: Box<dyn FnMut(FeedNotice) + Send> = Box::new(on_notice);
        let callback: SharedCallback = Arc::new(Mutex::new(Some(boxed)));
        let task_callback = Arc::clone(&callback);
        let task = tokio::spawn(async move {
            while let Some(notice) = subscription.recv().await {
                let mut guard = task_callback.lock().unwrap_or_else(PoisonError::into_inner);
                match guard.as_mut() {
                    Some(on_notice) => on_notice(notice),
                    None => break,
                }
            }
        });
        CallbackHandle { callback, task }
    }

    /// Number of filters with a live upstream connection.
    pub fn active_channels(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn subscriber_count(&self, filter: &TableFilter) -> usize {
        self.registry
            .lock()
            .get(filter)
            .map_or(0, |channel| channel.subscribers)
    }

    fn open_channel(&self, filter: &TableFilter) -> Channel {
        let (notices, _) = broadcast::channel(self.config.channel_capacity.max(1));
        let (ready_tx, ready) = watch::channel(false);
        let pump = tokio::spawn(
            Pump {
                source: Arc::clone(&self.source),
                filter: filter.clone(),
                notices: notices.clone(),
                ready: ready_tx,
                config: self.config,
            }
            .run(),
        );
        let generation = self.registry.generations.fetch_add(1, Ordering::Relaxed);
        debug!(filter = %filter, generation, "change feed channel opened");
        Channel {
            generation,
            notices,
            ready,
            subscribers: 0,
            pump,
        }
    }
}

/// A live registration. Dropping it releases the registration.
pub struct Subscription {
    filter: TableFilter,
    generation: u64,
    receiver: broadcast::Receiver<FeedNotice>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub fn filter(&self) -> &TableFilter {
        &self.filter
    }

    /// Next notice, or `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<FeedNotice> {
        match self.receiver.recv().await {
            Ok(notice) => Some(notice),
            Err(RecvError::Lagged(skipped)) => {
                warn!(filter = %self.filter, skipped, "change feed subscriber lagged");
                Some(FeedNotice::Lagged { skipped })
            }
            Err(RecvError::Closed) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(&self.filter, self.generation);
    }
}

type SharedCallback = Arc<Mutex<Option<Box<dyn FnMut(FeedNotice) + Send>>>>;

/// Handle for a callback subscription.
pub struct CallbackHandle {
    callback: SharedCallback,
    task: JoinHandle<()>,
}

impl CallbackHandle {
    /// Stop delivery. No callback runs after this returns.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        // Clearing under the lock waits out any in-flight invocation.
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.task.abort();
    }
}
