// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus, Bid};
use crate::error::AuctionError;
use crate::feed::{Feed, FeedFilter};
use crate::identity::{AdminPolicy, CurrentIdentity};
use crate::lifecycle::{format_time_remaining, is_live};
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    pub bidder_name: String,
    pub amount: f64,
}

/// An auction record together with the state derived from the clock at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionView {
    #[serde(flatten)]
    pub item: AuctionItem,
    pub display_price: f64,
    pub is_live: bool,
    pub time_remaining: String,
    pub winner: Option<Winner>,
}

impl AuctionView {
    pub fn new(item: AuctionItem, now: DateTime<Utc>) -> Self {
        let winner = item.winner(now).map(|(bidder_name, amount)| Winner {
            bidder_name: bidder_name.to_string(),
            amount,
        });
        Self {
            display_price: item.display_price(),
            is_live: is_live(&item, now),
            time_remaining: format_time_remaining(&item, now),
            winner,
            item,
        }
    }

    pub fn from_items(items: Vec<AuctionItem>, now: DateTime<Utc>) -> Vec<Self> {
        items.into_iter().map(|item| Self::new(item, now)).collect()
    }
}
// endregion: --- Views

// region:    --- Query Handlers

/// Auctions with the given status, ordered for display.
pub async fn get_auctions(
    feed: &Feed,
    status: AuctionStatus,
    identity: &CurrentIdentity,
) -> Result<Vec<AuctionView>, AuctionError> {
    info!("{:<12} --> list {} auctions", "Query", status);
    let now = Utc::now();
    let items = feed
        .snapshot(FeedFilter { status }, identity, now)
        .await?;
    Ok(AuctionView::from_items(items, now))
}

/// One auction. Listings that are not approved only exist for the administrator.
pub async fn get_auction(
    store: &dyn AuctionStore,
    id: i64,
    identity: &CurrentIdentity,
    admin: &AdminPolicy,
) -> Result<AuctionView, AuctionError> {
    info!("{:<12} --> get auction id: {}", "Query", id);
    let item = visible(store, id, identity, admin).await?;
    Ok(AuctionView::new(item, Utc::now()))
}

/// Accepted bids, newest first.
pub async fn get_bid_history(
    store: &dyn AuctionStore,
    id: i64,
    identity: &CurrentIdentity,
    admin: &AdminPolicy,
) -> Result<Vec<Bid>, AuctionError> {
    info!("{:<12} --> bid history id: {}", "Query", id);
    let item = visible(store, id, identity, admin).await?;
    Ok(item.bid_history().into_iter().cloned().collect())
}

async fn visible(
    store: &dyn AuctionStore,
    id: i64,
    identity: &CurrentIdentity,
    admin: &AdminPolicy,
) -> Result<AuctionItem, AuctionError> {
    let item = store.get(id).await?;
    if item.status != AuctionStatus::Approved && !admin.is_admin(identity) {
        return Err(AuctionError::NotFound(id));
    }
    Ok(item)
}

// endregion: --- Query Handlers

// endregion: --- Tests
