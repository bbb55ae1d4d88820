//! Live auction feeds.
//! A subscription delivers the full matching set, already ordered for display, once on
//! subscribe and again after every committed change and every clock tick.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionItem, AuctionStatus};
use crate::error::AuctionError;
use crate::identity::{AdminPolicy, CurrentIdentity};
use crate::query::sort::sort_feed;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Signals
pub const FEED_CHANNEL_CAPACITY: usize = 256;

/// What wakes feed subscriptions up.
#[derive(Debug, Clone)]
pub enum FeedSignal {
    /// A write was committed.
    Changed(AuctionEvent),
    /// Periodic clock tick; liveness changes without any write.
    Tick(DateTime<Utc>),
}

pub fn signal_channel() -> broadcast::Sender<FeedSignal> {
    broadcast::channel(FEED_CHANNEL_CAPACITY).0
}
// endregion: --- Signals

// region:    --- Feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedFilter {
    pub status: AuctionStatus,
}

impl FeedFilter {
    pub fn approved() -> Self {
        Self {
            status: AuctionStatus::Approved,
        }
    }

    pub fn pending() -> Self {
        Self {
            status: AuctionStatus::Pending,
        }
    }
}

#[derive(Clone)]
pub struct Feed {
    store: Arc<dyn AuctionStore>,
    signals: broadcast::Sender<FeedSignal>,
    admin: AdminPolicy,
}

impl Feed {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        signals: broadcast::Sender<FeedSignal>,
        admin: AdminPolicy,
    ) -> Self {
        Self {
            store,
            signals,
            admin,
        }
    }

    /// Fetches the current matching set once, ordered for display.
    pub async fn snapshot(
        &self,
        filter: FeedFilter,
        identity: &CurrentIdentity,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionItem>, AuctionError> {
        self.authorize(filter, identity)?;
        load(self.store.as_ref(), filter, now).await
    }

    /// Opens a subscription. Only the administrator may watch the pending queue.
    pub async fn subscribe(
        &self,
        filter: FeedFilter,
        identity: &CurrentIdentity,
    ) -> Result<Subscription, AuctionError> {
        self.authorize(filter, identity)?;

        // Listen before loading so nothing committed in between is missed.
        let signals = self.signals.subscribe();
        let initial = load(self.store.as_ref(), filter, Utc::now()).await?;
        let (sender, receiver) = watch::channel(initial);

        info!("{:<12} --> subscribed to {} auctions", "Feed", filter.status);
        let task = tokio::spawn(run_subscription(
            Arc::clone(&self.store),
            filter,
            sender,
            signals,
        ));

        Ok(Subscription {
            receiver,
            cancel: CancelHandle { task },
        })
    }

    fn authorize(&self, filter: FeedFilter, identity: &CurrentIdentity) -> Result<(), AuctionError> {
        match filter.status {
            AuctionStatus::Approved => Ok(()),
            _ => self.admin.authorize(identity),
        }
    }
}

async fn load(
    store: &dyn AuctionStore,
    filter: FeedFilter,
    now: DateTime<Utc>,
) -> Result<Vec<AuctionItem>, AuctionError> {
    let mut items = store.list_by_status(filter.status).await?;
    sort_feed(&mut items, filter.status, now);
    Ok(items)
}

async fn run_subscription(
    store: Arc<dyn AuctionStore>,
    filter: FeedFilter,
    sender: watch::Sender<Vec<AuctionItem>>,
    mut signals: broadcast::Receiver<FeedSignal>,
) {
    loop {
        let signal = tokio::select! {
            signal = signals.recv() => signal,
            _ = sender.closed() => break,
        };

        match signal {
            Ok(FeedSignal::Changed(event)) => {
                debug!(
                    "{:<12} --> {} on auction {}",
                    "Feed",
                    event.event_type(),
                    event.auction_id()
                );
                refresh(store.as_ref(), filter, &sender).await;
            }
            Ok(FeedSignal::Tick(now)) => {
                // Every tick is delivered: countdowns and liveness are derived at read time.
                sender.send_modify(|items| sort_feed(items, filter.status, now));
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("{:<12} --> lagged behind by {} signals", "Feed", skipped);
                refresh(store.as_ref(), filter, &sender).await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("{:<12} --> subscription to {} closed", "Feed", filter.status);
}

async fn refresh(
    store: &dyn AuctionStore,
    filter: FeedFilter,
    sender: &watch::Sender<Vec<AuctionItem>>,
) {
    match load(store, filter, Utc::now()).await {
        Ok(items) => {
            sender.send_if_modified(|current| {
                if *current == items {
                    return false;
                }
                *current = items;
                true
            });
        }
        Err(e) => warn!("{:<12} --> refresh failed: {}", "Feed", e),
    }
}
// endregion: --- Feed

// region:    --- Subscription
/// Stops the subscription task when cancelled or dropped.
#[derive(Debug)]
pub struct CancelHandle {
    task: JoinHandle<()>,
}

impl CancelHandle {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct Subscription {
    receiver: watch::Receiver<Vec<AuctionItem>>,
    cancel: CancelHandle,
}

impl Subscription {
    /// Latest delivered set.
    pub fn current(&self) -> Vec<AuctionItem> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next delivered set. `None` once the subscription has stopped.
    pub async fn next(&mut self) -> Option<Vec<AuctionItem>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Splits into a stream that yields the current set first, and its cancel handle.
    pub fn into_parts(self) -> (WatchStream<Vec<AuctionItem>>, CancelHandle) {
        (WatchStream::new(self.receiver), self.cancel)
    }

    pub fn cancel(self) {
        self.cancel.cancel();
    }
}
// endregion: --- Subscription

// endregion: --- Tests
