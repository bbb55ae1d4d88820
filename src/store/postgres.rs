//! PostgreSQL-backed store.
//! Every write is one transaction: the conditional `UPDATE` on `auctions`, the child row
//! (bid), and the `auction_events` log entry commit together or not at all. Committed
//! events are then handed to the publisher.
// region:    --- Imports
use super::{queries, rejection_for, AuctionStore};
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionItem, AuctionStatus, Bid, NewAuction};
use crate::bidding::evaluator;
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::event_store::{EventPublisher, StoredEvent};
use crate::lifecycle::{self, Transition, TransitionError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Rows
#[derive(Debug, FromRow)]
struct AuctionRow {
    id: i64,
    card_name: String,
    image_url: String,
    description: String,
    seller_name: String,
    starting_bid: f64,
    current_bid: f64,
    highest_bidder: Option<String>,
    end_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct BidRow {
    auction_id: i64,
    bidder_name: String,
    amount: f64,
    bid_time: DateTime<Utc>,
}

impl BidRow {
    fn into_bid(self) -> Bid {
        Bid {
            amount: self.amount,
            bidder_name: self.bidder_name,
            timestamp: self.bid_time,
        }
    }
}

impl AuctionRow {
    fn into_item(self, bids: Vec<Bid>) -> Result<AuctionItem, AuctionError> {
        let status = self
            .status
            .parse::<AuctionStatus>()
            .map_err(|e| AuctionError::Store(e.to_string()))?;
        let item = AuctionItem {
            id: self.id,
            card_name: self.card_name,
            image_url: self.image_url,
            description: self.description,
            seller_name: self.seller_name,
            starting_bid: self.starting_bid,
            current_bid: self.current_bid,
            highest_bidder: self.highest_bidder,
            end_time: self.end_time,
            bids,
            status,
            created_at: self.created_at,
        };
        if let Err(violation) = item.check_invariants() {
            warn!("{:<12} --> auction {}: {}", "Store", item.id, violation);
        }
        Ok(item)
    }
}
// endregion: --- Rows

// region:    --- Reads
/// Row and bids must come from the same snapshot.
const SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

async fn fetch_auction(conn: &mut PgConnection, id: i64) -> Result<AuctionItem, AuctionError> {
    let row = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AuctionError::NotFound(id))?;
    let bids = sqlx::query_as::<_, BidRow>(queries::GET_AUCTION_BIDS)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    row.into_item(bids.into_iter().map(BidRow::into_bid).collect())
}

async fn fetch_by_status(
    conn: &mut PgConnection,
    status: AuctionStatus,
) -> Result<Vec<AuctionItem>, AuctionError> {
    let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTIONS_BY_STATUS)
        .bind(status.as_str())
        .fetch_all(&mut *conn)
        .await?;
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let mut bids: HashMap<i64, Vec<Bid>> = HashMap::new();
    if !ids.is_empty() {
        let bid_rows = sqlx::query_as::<_, BidRow>(queries::GET_BIDS_FOR_AUCTIONS)
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
        for row in bid_rows {
            bids.entry(row.auction_id).or_default().push(row.into_bid());
        }
    }

    rows.into_iter()
        .map(|row| {
            let item_bids = bids.remove(&row.id).unwrap_or_default();
            row.into_item(item_bids)
        })
        .collect()
}
// endregion: --- Reads

// region:    --- Postgres Auction Store
pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
    publisher: Arc<dyn EventPublisher>,
}

impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { db, publisher }
    }

    async fn append_event(
        tx: &mut Transaction<'_, Postgres>,
        event: &AuctionEvent,
        timestamp: DateTime<Utc>,
        version: i64,
    ) -> Result<(), AuctionError> {
        let stored = StoredEvent::new(event, timestamp, version)?;
        sqlx::query_scalar::<_, i64>(queries::INSERT_EVENT)
            .bind(stored.auction_id)
            .bind(&stored.event_type)
            .bind(&stored.data)
            .bind(stored.timestamp)
            .bind(stored.version)
            .fetch_optional(&mut **tx)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                AuctionError::Store(format!("version conflict on auction {}", stored.auction_id))
            })
    }

    /// The write is already committed; a lost notification is only logged.
    async fn publish(&self, event: &AuctionEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            warn!(
                "{:<12} --> could not publish {} for auction {}: {}",
                "Store",
                event.event_type(),
                event.auction_id(),
                e
            );
        }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create(&self, listing: NewAuction) -> Result<AuctionItem, AuctionError> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        let id = sqlx::query_scalar::<_, i64>(queries::INSERT_AUCTION)
            .bind(&listing.card_name)
            .bind(&listing.image_url)
            .bind(&listing.description)
            .bind(&listing.seller_name)
            .bind(listing.starting_bid)
            .bind(listing.end_time)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let event = AuctionEvent::ListingSubmitted {
            auction_id: id,
            seller_name: listing.seller_name.clone(),
            timestamp: now,
        };
        Self::append_event(&mut tx, &event, now, 0).await?;
        tx.commit().await?;
        info!("{:<12} --> listing {} stored", "Store", id);

        self.publish(&event).await;
        self.get(id).await
    }

    async fn get(&self, id: i64) -> Result<AuctionItem, AuctionError> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query(SNAPSHOT).execute(&mut **tx).await?;
                    fetch_auction(&mut **tx, id).await
                })
            })
            .await
    }

    async fn list_by_status(
        &self,
        status: AuctionStatus,
    ) -> Result<Vec<AuctionItem>, AuctionError> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query(SNAPSHOT).execute(&mut **tx).await?;
                    fetch_by_status(&mut **tx, status).await
                })
            })
            .await
    }

    async fn try_bid(
        &self,
        id: i64,
        amount: f64,
        bidder_name: &str,
    ) -> Result<AuctionItem, AuctionError> {
        if evaluator::check_bid_input(amount, bidder_name).is_err() {
            // Report whichever rule fails first against the stored record.
            let record = self.get(id).await?;
            return Err(rejection_for(&record, amount, bidder_name, Utc::now()));
        }
        let bidder_name = bidder_name.trim();

        let mut tx = self.db.pool().begin().await?;
        let accepted = sqlx::query_as::<_, (i64, DateTime<Utc>)>(queries::CONDITIONAL_BID)
            .bind(amount)
            .bind(bidder_name)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((version, now)) = accepted else {
            let now = sqlx::query_scalar::<_, DateTime<Utc>>(queries::CLOCK)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;
            let record = self.get(id).await?;
            let err = rejection_for(&record, amount, bidder_name, now);
            info!("{:<12} --> bid on {} refused: {}", "Store", id, err);
            return Err(err);
        };

        sqlx::query(queries::INSERT_BID)
            .bind(id)
            .bind(bidder_name)
            .bind(amount)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let event = AuctionEvent::BidPlaced {
            auction_id: id,
            bidder_name: bidder_name.to_string(),
            amount,
            timestamp: now,
        };
        Self::append_event(&mut tx, &event, now, version).await?;
        tx.commit().await?;
        info!(
            "{:<12} --> bid accepted on {}: current bid {}",
            "Store", id, amount
        );

        self.publish(&event).await;
        self.get(id).await
    }

    async fn set_status(
        &self,
        id: i64,
        status: AuctionStatus,
    ) -> Result<AuctionItem, AuctionError> {
        if status == AuctionStatus::Pending {
            return Err(TransitionError::NotADecision(status).into());
        }

        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;
        let version = sqlx::query_scalar::<_, i64>(queries::CONDITIONAL_STATUS)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(version) = version else {
            tx.rollback().await?;
            // Already decided: same decision is a no-op, the opposite one an error.
            let record = self.get(id).await?;
            return match lifecycle::transition(record, status)? {
                Transition::Unchanged(item) => Ok(item),
                Transition::Changed(_) => {
                    Err(AuctionError::Store(format!("write conflict on auction {id}")))
                }
            };
        };

        let event = AuctionEvent::StatusChanged {
            auction_id: id,
            status,
            timestamp: now,
        };
        Self::append_event(&mut tx, &event, now, version).await?;
        tx.commit().await?;
        info!("{:<12} --> auction {} is now {}", "Store", id, status);

        self.publish(&event).await;
        self.get(id).await
    }
}
// endregion: --- Postgres Auction Store
