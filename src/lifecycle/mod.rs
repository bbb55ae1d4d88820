//! Listing approval and time-based auction state.
//! Liveness and the countdown label are derived from `(record, now)` on every read and are
//! never stored.
// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

// endregion: --- Imports

pub mod commands;

// region:    --- Status Transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The record moved out of `Pending` and must be written.
    Changed(AuctionItem),
    /// The record already carries the requested decision; nothing to write.
    Unchanged(AuctionItem),
}

impl Transition {
    pub fn into_record(self) -> AuctionItem {
        match self {
            Transition::Changed(record) | Transition::Unchanged(record) => record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("auction was already {from} and cannot become {to}")]
    InvalidTransition {
        from: AuctionStatus,
        to: AuctionStatus,
    },
    #[error("{0} is not an administrator decision")]
    NotADecision(AuctionStatus),
}

pub fn approve(record: AuctionItem) -> Result<Transition, TransitionError> {
    transition(record, AuctionStatus::Approved)
}

pub fn reject(record: AuctionItem) -> Result<Transition, TransitionError> {
    transition(record, AuctionStatus::Rejected)
}

/// Applies an administrator decision. Repeating the decision already taken is a no-op;
/// reversing a decision is refused.
pub fn transition(
    mut record: AuctionItem,
    target: AuctionStatus,
) -> Result<Transition, TransitionError> {
    if target == AuctionStatus::Pending {
        return Err(TransitionError::NotADecision(target));
    }
    match record.status {
        AuctionStatus::Pending => {
            record.status = target;
            Ok(Transition::Changed(record))
        }
        current if current == target => Ok(Transition::Unchanged(record)),
        current => Err(TransitionError::InvalidTransition {
            from: current,
            to: target,
        }),
    }
}
// endregion: --- Status Transitions

// region:    --- Activity
/// Approved and not yet past its end time.
pub fn is_live(record: &AuctionItem, now: DateTime<Utc>) -> bool {
    record.status == AuctionStatus::Approved && record.end_time > now
}

/// Whole units left before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    /// `None` once the delta is zero or negative.
    pub fn from_delta(delta: Duration) -> Option<Self> {
        let millis = delta.num_milliseconds();
        if millis <= 0 {
            return None;
        }
        let total_seconds = millis / 1000;
        Some(Self {
            days: total_seconds / 86_400,
            hours: (total_seconds / 3_600) % 24,
            minutes: (total_seconds / 60) % 60,
            seconds: total_seconds % 60,
        })
    }

    /// Compact label such as `2d 3h 5m 10s` or `45s`.
    pub fn label(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if self.days > 0 {
            parts.push(format!("{}d", self.days));
        }
        if self.hours > 0 || self.days > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 || self.hours > 0 || self.days > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        parts.push(format!("{}s", self.seconds));
        parts.join(" ")
    }
}

pub const ENDED_LABEL: &str = "ended";

pub fn format_remaining(delta: Duration) -> String {
    match TimeRemaining::from_delta(delta) {
        Some(remaining) => remaining.label(),
        None => ENDED_LABEL.to_string(),
    }
}

pub fn format_time_remaining(record: &AuctionItem, now: DateTime<Utc>) -> String {
    format_remaining(record.end_time - now)
}
// endregion: --- Activity

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;

    fn pending(now: DateTime<Utc>) -> AuctionItem {
        NewAuction {
            card_name: "Mewtwo".to_string(),
            image_url: String::new(),
            description: String::new(),
            seller_name: "giovanni".to_string(),
            starting_bid: 10.0,
            end_time: now + Duration::hours(1),
        }
        .into_item(3, now)
    }

    #[test]
    fn approve_and_reject_leave_pending() {
        let now = Utc::now();
        let approved = approve(pending(now)).unwrap();
        assert!(matches!(&approved, Transition::Changed(r) if r.status == AuctionStatus::Approved));

        let rejected = reject(pending(now)).unwrap();
        assert!(matches!(&rejected, Transition::Changed(r) if r.status == AuctionStatus::Rejected));
    }

    #[test]
    fn repeating_a_decision_is_a_no_op() {
        let now = Utc::now();
        let approved = approve(pending(now)).unwrap().into_record();
        assert!(matches!(approve(approved), Ok(Transition::Unchanged(_))));
    }

    #[test]
    fn reversing_a_decision_is_refused() {
        let now = Utc::now();
        let rejected = reject(pending(now)).unwrap().into_record();
        assert_eq!(
            approve(rejected),
            Err(TransitionError::InvalidTransition {
                from: AuctionStatus::Rejected,
                to: AuctionStatus::Approved,
            })
        );
    }

    #[test]
    fn pending_is_not_a_target() {
        let now = Utc::now();
        assert_eq!(
            transition(pending(now), AuctionStatus::Pending),
            Err(TransitionError::NotADecision(AuctionStatus::Pending))
        );
    }

    #[test]
    fn live_requires_approval_and_time_left() {
        let now = Utc::now();
        let mut record = pending(now);
        assert!(!is_live(&record, now));

        record.status = AuctionStatus::Approved;
        assert!(is_live(&record, now));
        assert!(!is_live(&record, record.end_time));
    }

    #[test]
    fn labels_show_only_needed_units() {
        assert_eq!(format_remaining(Duration::milliseconds(90_061_000)), "1d 1h 1m 1s");
        assert_eq!(format_remaining(Duration::milliseconds(45_000)), "45s");
        assert_eq!(format_remaining(Duration::zero()), "ended");
        assert_eq!(format_remaining(Duration::seconds(-3)), "ended");
        assert_eq!(format_remaining(Duration::seconds(3_600)), "1h 0m 0s");
        assert_eq!(format_remaining(Duration::seconds(86_400 + 5)), "1d 0h 0m 5s");
        assert_eq!(format_remaining(Duration::seconds(2 * 60 + 7)), "2m 7s");
    }

    #[test]
    fn sub_second_remainder_still_counts_as_running() {
        assert_eq!(format_remaining(Duration::milliseconds(400)), "0s");
    }

    #[test]
    fn record_label_uses_end_time() {
        let now = Utc::now();
        let record = pending(now);
        assert_eq!(format_time_remaining(&record, now), "1h 0m 0s");
        assert_eq!(format_time_remaining(&record, record.end_time), "ended");
    }
}
// endregion: --- Tests
