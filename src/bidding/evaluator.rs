//! Bid acceptance rules.
//! Pure functions over a snapshot of an auction; the stores run the same rules
//! again against the committed state when they apply the write.
// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus, Bid};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Rejections
/// Why a bid was refused. Variants are listed in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum BidRejection {
    #[error("auction is not open for bidding")]
    NotApproved,
    #[error("auction has already ended")]
    AuctionEnded,
    #[error("bidder name is required")]
    MissingBidderName,
    #[error("bid amount must be a positive number")]
    InvalidAmount,
    #[error("bid must be higher than the current bid")]
    BidTooLow,
}

impl BidRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::NotApproved => "NOT_APPROVED",
            BidRejection::AuctionEnded => "ALREADY_ENDED",
            BidRejection::MissingBidderName => "MISSING_BIDDER_NAME",
            BidRejection::InvalidAmount => "INVALID_AMOUNT",
            BidRejection::BidTooLow => "LOW_BID",
        }
    }
}
// endregion: --- Rejections

// region:    --- Evaluator
/// Outcome of an accepted bid: the record as it must be committed, and the new bid.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedBid {
    pub record: AuctionItem,
    pub bid: Bid,
}

/// Decides whether `proposed_amount` from `bidder_name` can be accepted at `now`.
pub fn evaluate(
    record: &AuctionItem,
    proposed_amount: f64,
    bidder_name: &str,
    now: DateTime<Utc>,
) -> Result<AcceptedBid, BidRejection> {
    if record.status != AuctionStatus::Approved {
        return Err(BidRejection::NotApproved);
    }
    if record.end_time <= now {
        return Err(BidRejection::AuctionEnded);
    }

    let bidder_name = bidder_name.trim();
    if bidder_name.is_empty() {
        return Err(BidRejection::MissingBidderName);
    }
    if !proposed_amount.is_finite() || proposed_amount <= 0.0 {
        return Err(BidRejection::InvalidAmount);
    }
    if proposed_amount <= record.current_bid {
        return Err(BidRejection::BidTooLow);
    }

    let bid = Bid {
        amount: proposed_amount,
        bidder_name: bidder_name.to_string(),
        timestamp: now,
    };
    let mut record = record.clone();
    record.current_bid = proposed_amount;
    record.highest_bidder = Some(bid.bidder_name.clone());
    record.bids.push(bid.clone());

    Ok(AcceptedBid { record, bid })
}

/// Input-only part of the rules: does not look at the auction at all.
pub fn check_bid_input(proposed_amount: f64, bidder_name: &str) -> Result<(), BidRejection> {
    if bidder_name.trim().is_empty() {
        return Err(BidRejection::MissingBidderName);
    }
    if !proposed_amount.is_finite() || proposed_amount <= 0.0 {
        return Err(BidRejection::InvalidAmount);
    }
    Ok(())
}
// endregion: --- Evaluator

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;
    use chrono::Duration;

    fn approved_at(now: DateTime<Utc>, current_bid: f64) -> AuctionItem {
        let mut item = NewAuction {
            card_name: "Pikachu Illustrator".to_string(),
            image_url: String::new(),
            description: String::new(),
            seller_name: "oak".to_string(),
            starting_bid: 50.0,
            end_time: now + Duration::minutes(10),
        }
        .into_item(1, now);
        item.status = AuctionStatus::Approved;
        item.current_bid = current_bid;
        item
    }

    #[test]
    fn accepts_a_higher_bid_and_records_it() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);

        let accepted = evaluate(&record, 75.5, "  misty ", now).unwrap();

        assert_eq!(accepted.bid.amount, 75.5);
        assert_eq!(accepted.bid.bidder_name, "misty");
        assert_eq!(accepted.bid.timestamp, now);
        assert_eq!(accepted.record.current_bid, 75.5);
        assert_eq!(accepted.record.highest_bidder.as_deref(), Some("misty"));
        assert_eq!(accepted.record.bids, vec![accepted.bid.clone()]);
        assert_eq!(accepted.record.check_invariants(), Ok(()));
    }

    #[test]
    fn equal_bid_is_too_low() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);
        assert_eq!(evaluate(&record, 50.0, "misty", now), Err(BidRejection::BidTooLow));
        assert_eq!(evaluate(&record, 49.0, "misty", now), Err(BidRejection::BidTooLow));
    }

    #[test]
    fn unapproved_auction_rejects_even_a_winning_amount() {
        let now = Utc::now();
        for status in [AuctionStatus::Pending, AuctionStatus::Rejected] {
            let mut record = approved_at(now, 50.0);
            record.status = status;
            assert_eq!(
                evaluate(&record, 1_000.0, "misty", now),
                Err(BidRejection::NotApproved)
            );
        }
    }

    #[test]
    fn bid_at_the_deadline_is_rejected() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);
        assert_eq!(
            evaluate(&record, 60.0, "misty", record.end_time),
            Err(BidRejection::AuctionEnded)
        );
        assert_eq!(
            evaluate(&record, 60.0, "misty", record.end_time + Duration::seconds(1)),
            Err(BidRejection::AuctionEnded)
        );
    }

    #[test]
    fn blank_bidder_name_is_rejected() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);
        assert_eq!(
            evaluate(&record, 60.0, "   ", now),
            Err(BidRejection::MissingBidderName)
        );
    }

    #[test]
    fn non_finite_or_non_positive_amounts_are_invalid() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);
        for amount in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            assert_eq!(
                evaluate(&record, amount, "misty", now),
                Err(BidRejection::InvalidAmount)
            );
        }
    }

    #[test]
    fn first_failing_check_wins() {
        let now = Utc::now();
        let mut record = approved_at(now, 50.0);
        record.status = AuctionStatus::Pending;
        record.end_time = now - Duration::seconds(1);
        assert_eq!(evaluate(&record, -1.0, "", now), Err(BidRejection::NotApproved));

        record.status = AuctionStatus::Approved;
        assert_eq!(evaluate(&record, -1.0, "", now), Err(BidRejection::AuctionEnded));

        record.end_time = now + Duration::seconds(1);
        assert_eq!(
            evaluate(&record, -1.0, "", now),
            Err(BidRejection::MissingBidderName)
        );
        assert_eq!(
            evaluate(&record, -1.0, "misty", now),
            Err(BidRejection::InvalidAmount)
        );
    }

    #[test]
    fn highest_bidder_may_raise_their_own_bid() {
        let now = Utc::now();
        let record = approved_at(now, 50.0);
        let first = evaluate(&record, 60.0, "misty", now).unwrap().record;
        let second = evaluate(&first, 70.0, "misty", now).unwrap().record;
        assert_eq!(second.bids.len(), 2);
        assert_eq!(second.current_bid, 70.0);
        assert_eq!(second.check_invariants(), Ok(()));
    }

    #[test]
    fn current_bid_tracks_the_maximum_accepted_amount() {
        let now = Utc::now();
        let mut record = approved_at(now, 50.0);
        let attempts = [
            (55.0, "a"),
            (54.0, "b"),
            (80.0, "c"),
            (80.0, "d"),
            (81.0, "e"),
            (10.0, "f"),
        ];
        let mut best = (50.0, None);
        for (amount, bidder) in attempts {
            if let Ok(accepted) = evaluate(&record, amount, bidder, now) {
                record = accepted.record;
                best = (amount, Some(bidder.to_string()));
            }
            assert!(record.current_bid >= record.starting_bid);
        }
        assert_eq!(record.current_bid, best.0);
        assert_eq!(record.highest_bidder, best.1);
        assert_eq!(record.bids.len(), 3);
        assert_eq!(record.check_invariants(), Ok(()));
    }

    #[test]
    fn input_checks_ignore_the_auction() {
        assert_eq!(check_bid_input(10.0, "misty"), Ok(()));
        assert_eq!(
            check_bid_input(10.0, " "),
            Err(BidRejection::MissingBidderName)
        );
        assert_eq!(
            check_bid_input(f64::NAN, "misty"),
            Err(BidRejection::InvalidAmount)
        );
    }
}
// endregion: --- Tests
