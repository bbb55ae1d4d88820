//! In-process store. Every write runs check-and-apply under one lock, which gives the
//! same at-most-one-wins guarantee as the conditional update in the PostgreSQL store.
// region:    --- Imports
use super::AuctionStore;
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionItem, AuctionStatus, NewAuction};
use crate::bidding::evaluator;
use crate::error::AuctionError;
use crate::event_store::EventPublisher;
use crate::lifecycle::{self, Transition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

// endregion: --- Imports

#[derive(Default)]
struct Records {
    next_id: i64,
    items: BTreeMap<i64, AuctionItem>,
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct InMemoryAuctionStore {
    records: RwLock<Records>,
    publisher: Arc<dyn EventPublisher>,
    clock: Clock,
}

impl InMemoryAuctionStore {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_clock(publisher, Arc::new(Utc::now))
    }

    pub fn with_clock(publisher: Arc<dyn EventPublisher>, clock: Clock) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            publisher,
            clock,
        }
    }

    /// Publishes while the caller still holds the write lock, so events for one
    /// auction leave in commit order.
    async fn publish(&self, event: AuctionEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> could not publish {}: {}",
                "Store",
                event.event_type(),
                e
            );
        }
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn create(&self, listing: NewAuction) -> Result<AuctionItem, AuctionError> {
        let mut records = self.records.write().await;
        records.next_id += 1;
        let now = (self.clock)();
        let item = listing.into_item(records.next_id, now);
        records.items.insert(item.id, item.clone());
        info!("{:<12} --> listing {} stored", "Store", item.id);

        self.publish(AuctionEvent::ListingSubmitted {
            auction_id: item.id,
            seller_name: item.seller_name.clone(),
            timestamp: now,
        })
        .await;
        Ok(item)
    }

    async fn get(&self, id: i64) -> Result<AuctionItem, AuctionError> {
        self.records
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or(AuctionError::NotFound(id))
    }

    async fn list_by_status(
        &self,
        status: AuctionStatus,
    ) -> Result<Vec<AuctionItem>, AuctionError> {
        Ok(self
            .records
            .read()
            .await
            .items
            .values()
            .filter(|item| item.status == status)
            .cloned()
            .collect())
    }

    async fn try_bid(
        &self,
        id: i64,
        amount: f64,
        bidder_name: &str,
    ) -> Result<AuctionItem, AuctionError> {
        let mut records = self.records.write().await;
        // Read only once the lock is held; waiting writers must not carry an old clock.
        let now = (self.clock)();
        let record = records.items.get_mut(&id).ok_or(AuctionError::NotFound(id))?;

        let accepted = match evaluator::evaluate(record, amount, bidder_name, now) {
            Ok(accepted) => accepted,
            Err(reason) => return Err(reason.into()),
        };
        *record = accepted.record;
        let item = record.clone();
        info!(
            "{:<12} --> bid accepted on {}: current bid {}",
            "Store", id, item.current_bid
        );

        self.publish(AuctionEvent::BidPlaced {
            auction_id: id,
            bidder_name: accepted.bid.bidder_name,
            amount: accepted.bid.amount,
            timestamp: accepted.bid.timestamp,
        })
        .await;
        drop(records);
        Ok(item)
    }

    async fn set_status(
        &self,
        id: i64,
        status: AuctionStatus,
    ) -> Result<AuctionItem, AuctionError> {
        let mut records = self.records.write().await;
        let record = records.items.get_mut(&id).ok_or(AuctionError::NotFound(id))?;

        match lifecycle::transition(record.clone(), status)? {
            Transition::Unchanged(item) => Ok(item),
            Transition::Changed(item) => {
                *record = item.clone();
                info!("{:<12} --> auction {} is now {}", "Store", id, status);
                self.publish(AuctionEvent::StatusChanged {
                    auction_id: id,
                    status,
                    timestamp: (self.clock)(),
                })
                .await;
                drop(records);
                Ok(item)
            }
        }
    }
}

// endregion: --- Tests
