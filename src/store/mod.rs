//! Auction store gateway: the sole durable owner of auction records.
// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus, NewAuction};
use crate::bidding::evaluator;
use crate::error::AuctionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;
pub mod queries;

// endregion: --- Imports

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Persists a validated listing as a pending auction and assigns its id.
    async fn create(&self, listing: NewAuction) -> Result<AuctionItem, AuctionError>;

    async fn get(&self, id: i64) -> Result<AuctionItem, AuctionError>;

    async fn list_by_status(&self, status: AuctionStatus)
        -> Result<Vec<AuctionItem>, AuctionError>;

    /// Atomically accepts a bid if the committed record still allows it. The end time is
    /// checked against the store's own clock, read once the record is held for the write.
    /// A bid that loses a race is rejected with the reason it fails against the
    /// committed state.
    async fn try_bid(
        &self,
        id: i64,
        amount: f64,
        bidder_name: &str,
    ) -> Result<AuctionItem, AuctionError>;

    /// Records an administrator decision on a pending listing.
    async fn set_status(&self, id: i64, status: AuctionStatus)
        -> Result<AuctionItem, AuctionError>;
}
// endregion: --- Auction Store Trait

/// Explains why a bid could not be committed against `record`.
pub(crate) fn rejection_for(
    record: &AuctionItem,
    amount: f64,
    bidder_name: &str,
    now: DateTime<Utc>,
) -> AuctionError {
    match evaluator::evaluate(record, amount, bidder_name, now) {
        Err(reason) => reason.into(),
        Ok(_) => AuctionError::Store(format!("write conflict on auction {}", record.id)),
    }
}
