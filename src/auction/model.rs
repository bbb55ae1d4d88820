// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Status
/// Approval state of a listing. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Pending,
    Approved,
    Rejected,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Pending => "pending",
            AuctionStatus::Approved => "approved",
            AuctionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown auction status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AuctionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuctionStatus::Pending),
            "approved" => Ok(AuctionStatus::Approved),
            "rejected" => Ok(AuctionStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
// endregion: --- Status

// region:    --- Records
/// An accepted bid. Never modified once appended to an auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub amount: f64,
    pub bidder_name: String,
    pub timestamp: DateTime<Utc>,
}

/// An auction as stored and displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionItem {
    pub id: i64,
    pub card_name: String,
    /// URL or embedded image data; empty means the display fallback is used.
    pub image_url: String,
    pub description: String,
    pub seller_name: String,
    pub starting_bid: f64,
    pub current_bid: f64,
    pub highest_bidder: Option<String>,
    pub end_time: DateTime<Utc>,
    /// Insertion order. Use [`AuctionItem::bid_history`] for display order.
    pub bids: Vec<Bid>,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated listing that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuction {
    pub card_name: String,
    pub image_url: String,
    pub description: String,
    pub seller_name: String,
    pub starting_bid: f64,
    pub end_time: DateTime<Utc>,
}

impl NewAuction {
    /// Builds the initial record: pending, no bids, current bid at the starting bid.
    pub fn into_item(self, id: i64, created_at: DateTime<Utc>) -> AuctionItem {
        AuctionItem {
            id,
            card_name: self.card_name,
            image_url: self.image_url,
            description: self.description,
            seller_name: self.seller_name,
            starting_bid: self.starting_bid,
            current_bid: self.starting_bid,
            highest_bidder: None,
            end_time: self.end_time,
            bids: Vec::new(),
            status: AuctionStatus::Pending,
            created_at,
        }
    }
}
// endregion: --- Records

// region:    --- Invariants
#[derive(Debug, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("current bid {current} is below starting bid {starting}")]
    CurrentBelowStarting { current: f64, starting: f64 },
    #[error("bid #{index} of {amount} does not raise the previous price {previous}")]
    NonIncreasingBid {
        index: usize,
        amount: f64,
        previous: f64,
    },
    #[error("current bid {current} does not match the last accepted bid {expected}")]
    CurrentBidMismatch { current: f64, expected: f64 },
    #[error("highest bidder {found:?} does not match {expected:?}")]
    HighestBidderMismatch {
        found: Option<String>,
        expected: Option<String>,
    },
}

impl AuctionItem {
    /// Bids newest first. Bids sharing a timestamp keep their acceptance order, reversed.
    pub fn bid_history(&self) -> Vec<&Bid> {
        let mut history: Vec<&Bid> = self.bids.iter().rev().collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history
    }

    /// Price shown to buyers: the opening price until the listing is approved.
    pub fn display_price(&self) -> f64 {
        match self.status {
            AuctionStatus::Pending => self.starting_bid,
            _ => self.current_bid,
        }
    }

    /// Winning bidder and price once an approved auction has closed with bids.
    pub fn winner(&self, now: DateTime<Utc>) -> Option<(&str, f64)> {
        if self.status != AuctionStatus::Approved || self.end_time > now {
            return None;
        }
        self.highest_bidder
            .as_deref()
            .map(|bidder| (bidder, self.current_bid))
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.current_bid < self.starting_bid {
            return Err(InvariantViolation::CurrentBelowStarting {
                current: self.current_bid,
                starting: self.starting_bid,
            });
        }

        // Accepted bids must strictly raise the price in insertion order.
        let mut previous = self.starting_bid;
        for (index, bid) in self.bids.iter().enumerate() {
            if bid.amount <= previous {
                return Err(InvariantViolation::NonIncreasingBid {
                    index,
                    amount: bid.amount,
                    previous,
                });
            }
            previous = bid.amount;
        }

        if previous != self.current_bid {
            return Err(InvariantViolation::CurrentBidMismatch {
                current: self.current_bid,
                expected: previous,
            });
        }

        let expected = self.bids.last().map(|bid| bid.bidder_name.clone());
        if expected != self.highest_bidder {
            return Err(InvariantViolation::HighestBidderMismatch {
                found: self.highest_bidder.clone(),
                expected,
            });
        }

        Ok(())
    }
}
// endregion: --- Invariants

// endregion: --- Tests
