//! Seller listing submission: request shape and validation.
// region:    --- Imports
use crate::auction::model::NewAuction;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// endregion: --- Imports

pub mod commands;

// region:    --- Request
/// Default maximum distance of an auction's end time from submission.
pub const DEFAULT_MAX_AUCTION_HOURS: i64 = 720;

/// Either an absolute close time or a duration from submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndTimeSpec {
    At { end_time: DateTime<Utc> },
    Hours { duration_hours: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListingRequest {
    pub card_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub starting_bid: f64,
    #[serde(flatten)]
    pub end: EndTimeSpec,
    pub seller_name: String,
}
// endregion: --- Request

// region:    --- Validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("card name is required")]
    MissingCardName,
    #[error("seller name is required")]
    MissingSellerName,
    #[error("starting bid must be a positive number")]
    InvalidStartingBid,
    #[error("auction duration must be a positive number of hours")]
    InvalidDuration,
    #[error("auction end time must be in the future")]
    EndTimeNotInFuture,
    #[error("auction cannot run longer than {max_hours} hours")]
    BeyondHorizon { max_hours: i64 },
}

impl ListingError {
    pub fn code(&self) -> &'static str {
        match self {
            ListingError::MissingCardName => "MISSING_CARD_NAME",
            ListingError::MissingSellerName => "MISSING_SELLER_NAME",
            ListingError::InvalidStartingBid => "INVALID_STARTING_BID",
            ListingError::InvalidDuration => "INVALID_DURATION",
            ListingError::EndTimeNotInFuture => "END_TIME_IN_PAST",
            ListingError::BeyondHorizon { .. } => "BEYOND_HORIZON",
        }
    }
}

/// Checks a submission and normalises it into a [`NewAuction`].
pub fn validate(
    request: NewListingRequest,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Result<NewAuction, ListingError> {
    let card_name = request.card_name.trim();
    if card_name.is_empty() {
        return Err(ListingError::MissingCardName);
    }
    let seller_name = request.seller_name.trim();
    if seller_name.is_empty() {
        return Err(ListingError::MissingSellerName);
    }
    if !request.starting_bid.is_finite() || request.starting_bid <= 0.0 {
        return Err(ListingError::InvalidStartingBid);
    }

    let end_time = match request.end {
        EndTimeSpec::At { end_time } => end_time,
        EndTimeSpec::Hours { duration_hours } if duration_hours > 0 => {
            now + Duration::hours(duration_hours.min(horizon.num_hours() + 1))
        }
        EndTimeSpec::Hours { .. } => return Err(ListingError::InvalidDuration),
    };
    if end_time <= now {
        return Err(ListingError::EndTimeNotInFuture);
    }
    if end_time - now > horizon {
        return Err(ListingError::BeyondHorizon {
            max_hours: horizon.num_hours(),
        });
    }

    Ok(NewAuction {
        card_name: card_name.to_string(),
        image_url: request.image_url.unwrap_or_default().trim().to_string(),
        description: request.description.trim().to_string(),
        seller_name: seller_name.to_string(),
        starting_bid: request.starting_bid,
        end_time,
    })
}
// endregion: --- Validation

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> Duration {
        Duration::hours(DEFAULT_MAX_AUCTION_HOURS)
    }

    fn request(end: EndTimeSpec) -> NewListingRequest {
        NewListingRequest {
            card_name: " Blastoise ".to_string(),
            image_url: None,
            description: "1st edition".to_string(),
            starting_bid: 25.0,
            end,
            seller_name: "gary".to_string(),
        }
    }

    #[test]
    fn duration_becomes_an_absolute_end_time() {
        let now = Utc::now();
        let listing = validate(request(EndTimeSpec::Hours { duration_hours: 24 }), now, horizon())
            .unwrap();
        assert_eq!(listing.end_time, now + Duration::hours(24));
        assert_eq!(listing.card_name, "Blastoise");
        assert_eq!(listing.image_url, "");
    }

    #[test]
    fn negative_starting_bid_is_rejected() {
        let now = Utc::now();
        let mut req = request(EndTimeSpec::Hours { duration_hours: 24 });
        req.starting_bid = -5.0;
        assert_eq!(validate(req, now, horizon()), Err(ListingError::InvalidStartingBid));
    }

    #[test]
    fn non_finite_starting_bid_is_rejected() {
        let now = Utc::now();
        let mut req = request(EndTimeSpec::Hours { duration_hours: 24 });
        req.starting_bid = f64::NAN;
        assert_eq!(validate(req, now, horizon()), Err(ListingError::InvalidStartingBid));
    }

    #[test]
    fn end_time_past_the_horizon_is_rejected() {
        let now = Utc::now();
        let req = request(EndTimeSpec::At {
            end_time: now + Duration::days(31),
        });
        assert_eq!(
            validate(req, now, horizon()),
            Err(ListingError::BeyondHorizon { max_hours: 720 })
        );

        let req = request(EndTimeSpec::Hours { duration_hours: 721 });
        assert_eq!(
            validate(req, now, horizon()),
            Err(ListingError::BeyondHorizon { max_hours: 720 })
        );

        let huge = request(EndTimeSpec::Hours {
            duration_hours: i64::MAX,
        });
        assert_eq!(
            validate(huge, now, horizon()),
            Err(ListingError::BeyondHorizon { max_hours: 720 })
        );
    }

    #[test]
    fn end_time_exactly_at_the_horizon_is_accepted() {
        let now = Utc::now();
        let req = request(EndTimeSpec::Hours { duration_hours: 720 });
        assert!(validate(req, now, horizon()).is_ok());
    }

    #[test]
    fn end_time_must_be_in_the_future() {
        let now = Utc::now();
        let req = request(EndTimeSpec::At { end_time: now });
        assert_eq!(validate(req, now, horizon()), Err(ListingError::EndTimeNotInFuture));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let now = Utc::now();
        let req = request(EndTimeSpec::Hours { duration_hours: 0 });
        assert_eq!(validate(req, now, horizon()), Err(ListingError::InvalidDuration));
    }

    #[test]
    fn names_are_required() {
        let now = Utc::now();
        let mut req = request(EndTimeSpec::Hours { duration_hours: 1 });
        req.card_name = "  ".to_string();
        assert_eq!(validate(req, now, horizon()), Err(ListingError::MissingCardName));

        let mut req = request(EndTimeSpec::Hours { duration_hours: 1 });
        req.seller_name = String::new();
        assert_eq!(validate(req, now, horizon()), Err(ListingError::MissingSellerName));
    }

    #[test]
    fn request_accepts_either_end_form() {
        let by_duration: NewListingRequest = serde_json::from_value(serde_json::json!({
            "card_name": "Snorlax",
            "starting_bid": 5.0,
            "duration_hours": 48,
            "seller_name": "red"
        }))
        .unwrap();
        assert_eq!(by_duration.end, EndTimeSpec::Hours { duration_hours: 48 });

        let by_time: NewListingRequest = serde_json::from_value(serde_json::json!({
            "card_name": "Snorlax",
            "starting_bid": 5.0,
            "end_time": "2030-01-01T00:00:00Z",
            "seller_name": "red"
        }))
        .unwrap();
        assert!(matches!(by_time.end, EndTimeSpec::At { .. }));
    }
}
// endregion: --- Tests
