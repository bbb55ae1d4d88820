use crate::auction::model::{AuctionItem, AuctionStatus};
use crate::error::AuctionError;
use crate::identity::{AdminPolicy, CurrentIdentity};
use crate::store::AuctionStore;
use tracing::{info, warn};

/// Approves or rejects a pending listing on behalf of the administrator.
pub async fn handle_decision(
    auction_id: i64,
    decision: AuctionStatus,
    identity: &CurrentIdentity,
    admin: &AdminPolicy,
    store: &dyn AuctionStore,
) -> Result<AuctionItem, AuctionError> {
    if let Err(e) = admin.authorize(identity) {
        warn!(
            "{:<12} --> {} of {} denied for {:?}",
            "Command",
            decision,
            auction_id,
            identity.uid()
        );
        return Err(e);
    }
    info!("{:<12} --> {} auction {}", "Command", decision, auction_id);
    store.set_status(auction_id, decision).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;
    use crate::event_store::BroadcastPublisher;
    use crate::feed::signal_channel;
    use crate::store::memory::InMemoryAuctionStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    async fn pending() -> (InMemoryAuctionStore, i64) {
        let store = InMemoryAuctionStore::new(Arc::new(BroadcastPublisher::new(signal_channel())));
        let item = store
            .create(NewAuction {
                card_name: "Umbreon".to_string(),
                image_url: String::new(),
                description: String::new(),
                seller_name: "silver".to_string(),
                starting_bid: 20.0,
                end_time: Utc::now() + Duration::hours(3),
            })
            .await
            .unwrap();
        (store, item.id)
    }

    #[tokio::test]
    async fn administrator_can_approve() {
        let (store, id) = pending().await;
        let admin = AdminPolicy::new(Some("boss".to_string()));
        let item = handle_decision(
            id,
            AuctionStatus::Approved,
            &CurrentIdentity::user("boss"),
            &admin,
            &store,
        )
        .await
        .unwrap();
        assert_eq!(item.status, AuctionStatus::Approved);
    }

    #[tokio::test]
    async fn others_are_denied_without_a_write() {
        let (store, id) = pending().await;
        let admin = AdminPolicy::new(Some("boss".to_string()));
        let err = handle_decision(
            id,
            AuctionStatus::Rejected,
            &CurrentIdentity::user("grunt"),
            &admin,
            &store,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuctionError::Unauthorized));
        assert_eq!(store.get(id).await.unwrap().status, AuctionStatus::Pending);
    }
}
