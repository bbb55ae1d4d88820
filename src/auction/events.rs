use super::model::AuctionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted after every committed write to an auction.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // Seller submission
    ListingSubmitted {
        auction_id: i64,
        seller_name: String,
        timestamp: DateTime<Utc>,
    },
    // Administrator decision
    StatusChanged {
        auction_id: i64,
        status: AuctionStatus,
        timestamp: DateTime<Utc>,
    },
    // Accepted bid
    BidPlaced {
        auction_id: i64,
        bidder_name: String,
        amount: f64,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::ListingSubmitted { auction_id, .. }
            | AuctionEvent::StatusChanged { auction_id, .. }
            | AuctionEvent::BidPlaced { auction_id, .. } => *auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::ListingSubmitted { .. } => "ListingSubmitted",
            AuctionEvent::StatusChanged { .. } => "StatusChanged",
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
        }
    }
}
