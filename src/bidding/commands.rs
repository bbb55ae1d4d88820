//! Bid placement command.
//! Input is checked against the latest snapshot first so obviously bad bids never reach
//! the store; the store then repeats the checks atomically at commit time.
// region:    --- Imports
use super::evaluator;
use crate::auction::model::AuctionItem;
use crate::error::AuctionError;
use crate::store::AuctionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_name: String,
    pub amount: f64,
}

/// Body of `POST /auctions/:id/bids`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidRequest {
    pub bidder_name: String,
    pub amount: f64,
}

impl BidRequest {
    pub fn into_command(self, auction_id: i64) -> PlaceBidCommand {
        PlaceBidCommand {
            auction_id,
            bidder_name: self.bidder_name,
            amount: self.amount,
        }
    }
}

pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
) -> Result<AuctionItem, AuctionError> {
    info!("{:<12} --> place bid: {:?}", "Command", cmd);

    let snapshot = store.get(cmd.auction_id).await?;
    if let Err(reason) = evaluator::evaluate(&snapshot, cmd.amount, &cmd.bidder_name, Utc::now())
    {
        warn!(
            "{:<12} --> bid on {} refused locally: {}",
            "Command", cmd.auction_id, reason
        );
        return Err(reason.into());
    }

    // The store's clock at commit decides, not the one used above.
    store
        .try_bid(cmd.auction_id, cmd.amount, &cmd.bidder_name)
        .await
}
// endregion: --- Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{AuctionStatus, NewAuction};
    use crate::bidding::evaluator::BidRejection;
    use crate::event_store::BroadcastPublisher;
    use crate::feed::signal_channel;
    use crate::store::memory::InMemoryAuctionStore;
    use chrono::Duration;
    use std::sync::Arc;

    async fn approved_store() -> (InMemoryAuctionStore, i64) {
        let store = InMemoryAuctionStore::new(Arc::new(BroadcastPublisher::new(signal_channel())));
        let item = store
            .create(NewAuction {
                card_name: "Rayquaza".to_string(),
                image_url: String::new(),
                description: String::new(),
                seller_name: "steven".to_string(),
                starting_bid: 50.0,
                end_time: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();
        store
            .set_status(item.id, AuctionStatus::Approved)
            .await
            .unwrap();
        (store, item.id)
    }

    fn bid(auction_id: i64, bidder_name: &str, amount: f64) -> PlaceBidCommand {
        PlaceBidCommand {
            auction_id,
            bidder_name: bidder_name.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn accepted_bid_updates_the_record() {
        let (store, id) = approved_store().await;
        let item = handle_place_bid(bid(id, " may ", 60.0), &store).await.unwrap();
        assert_eq!(item.current_bid, 60.0);
        assert_eq!(item.highest_bidder.as_deref(), Some("may"));
        assert_eq!(item.bids.len(), 1);
    }

    #[tokio::test]
    async fn low_bid_is_refused_with_its_reason() {
        let (store, id) = approved_store().await;
        handle_place_bid(bid(id, "may", 60.0), &store).await.unwrap();

        let err = handle_place_bid(bid(id, "brendan", 60.0), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::Rejected(BidRejection::BidTooLow)));
        assert_eq!(store.get(id).await.unwrap().bids.len(), 1);
    }

    #[tokio::test]
    async fn missing_name_is_refused() {
        let (store, id) = approved_store().await;
        let err = handle_place_bid(bid(id, "", 60.0), &store).await.unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Rejected(BidRejection::MissingBidderName)
        ));
    }

    #[tokio::test]
    async fn unknown_auction_is_not_found() {
        let (store, _) = approved_store().await;
        let err = handle_place_bid(bid(999, "may", 60.0), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::NotFound(999)));
    }
}
// endregion: --- Tests
