use crate::auction::model::{AuctionItem, AuctionStatus};
use crate::lifecycle::is_live;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Display order for the public feed: live auctions first, soonest-ending first;
/// then ended auctions, most recently ended first. Ties fall back to the id.
pub fn display_order(a: &AuctionItem, b: &AuctionItem, now: DateTime<Utc>) -> Ordering {
    match (is_live(a, now), is_live(b, now)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.end_time.cmp(&b.end_time).then(a.id.cmp(&b.id)),
        (false, false) => b.end_time.cmp(&a.end_time).then(a.id.cmp(&b.id)),
    }
}

pub fn sort_for_display(items: &mut [AuctionItem], now: DateTime<Utc>) {
    items.sort_by(|a, b| display_order(a, b, now));
}

/// Orders a feed snapshot. The review queue of pending listings is oldest-first.
pub fn sort_feed(items: &mut [AuctionItem], status: AuctionStatus, now: DateTime<Utc>) {
    match status {
        AuctionStatus::Approved => sort_for_display(items, now),
        _ => items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
    }
}
