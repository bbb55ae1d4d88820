use super::{validate, NewListingRequest};
use crate::auction::model::AuctionItem;
use crate::error::AuctionError;
use crate::store::AuctionStore;
use chrono::{Duration, Utc};
use tracing::{info, warn};

/// Validates a seller submission and stores it as a pending listing.
pub async fn handle_submit_listing(
    request: NewListingRequest,
    horizon: Duration,
    store: &dyn AuctionStore,
) -> Result<AuctionItem, AuctionError> {
    info!(
        "{:<12} --> listing submitted by {}: {}",
        "Command", request.seller_name, request.card_name
    );
    let listing = validate(request, Utc::now(), horizon).map_err(|e| {
        warn!("{:<12} --> listing refused: {}", "Command", e);
        e
    })?;
    store.create(listing).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::AuctionStatus;
    use crate::event_store::BroadcastPublisher;
    use crate::feed::signal_channel;
    use crate::listing::{EndTimeSpec, ListingError, DEFAULT_MAX_AUCTION_HOURS};
    use crate::store::memory::InMemoryAuctionStore;
    use std::sync::Arc;

    fn request(starting_bid: f64) -> NewListingRequest {
        NewListingRequest {
            card_name: "Lapras".to_string(),
            image_url: Some("https://cards.example/lapras.png".to_string()),
            description: "Near mint".to_string(),
            starting_bid,
            end: EndTimeSpec::Hours { duration_hours: 24 },
            seller_name: "lorelei".to_string(),
        }
    }

    #[tokio::test]
    async fn valid_listing_is_stored_pending() {
        let store = InMemoryAuctionStore::new(Arc::new(BroadcastPublisher::new(signal_channel())));
        let item = handle_submit_listing(
            request(12.5),
            Duration::hours(DEFAULT_MAX_AUCTION_HOURS),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(item.status, AuctionStatus::Pending);
        assert_eq!(item.current_bid, 12.5);
        assert_eq!(item.image_url, "https://cards.example/lapras.png");
        assert!(item.bids.is_empty());
    }

    #[tokio::test]
    async fn invalid_listing_never_reaches_the_store() {
        let store = InMemoryAuctionStore::new(Arc::new(BroadcastPublisher::new(signal_channel())));
        let err = handle_submit_listing(
            request(-5.0),
            Duration::hours(DEFAULT_MAX_AUCTION_HOURS),
            &store,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Validation(ListingError::InvalidStartingBid)
        ));
        assert!(store
            .list_by_status(AuctionStatus::Pending)
            .await
            .unwrap()
            .is_empty());
    }
}
