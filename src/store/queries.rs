/// Listing insert
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (card_name, image_url, description, seller_name, starting_bid, current_bid, end_time, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $5, $6, 'pending', $7)
    RETURNING id
"#;

/// Single auction
pub const GET_AUCTION: &str = "SELECT id, card_name, image_url, description, seller_name, starting_bid, current_bid, highest_bidder, end_time, status, created_at FROM auctions WHERE id = $1";

/// Auctions by status
pub const GET_AUCTIONS_BY_STATUS: &str = "SELECT id, card_name, image_url, description, seller_name, starting_bid, current_bid, highest_bidder, end_time, status, created_at FROM auctions WHERE status = $1 ORDER BY id";

/// Bids of one auction, in acceptance order
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT auction_id, bidder_name, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY id
"#;

/// Bids of several auctions, in acceptance order
pub const GET_BIDS_FOR_AUCTIONS: &str = r#"
    SELECT auction_id, bidder_name, amount, bid_time
    FROM bids
    WHERE auction_id = ANY($1)
    ORDER BY id
"#;

/// Conditional bid write. Matches no row unless the auction is approved, still open by
/// the database clock and the amount beats the committed current bid. `clock_timestamp()`
/// is re-read when the row lock is finally granted, unlike `now()`.
pub const CONDITIONAL_BID: &str = r#"
    UPDATE auctions
    SET current_bid = $1, highest_bidder = $2, version = version + 1
    WHERE id = $3 AND status = 'approved' AND end_time > clock_timestamp() AND current_bid < $1
    RETURNING version, clock_timestamp() AS bid_time
"#;

/// Database clock, used to explain a refused bid
pub const CLOCK: &str = "SELECT clock_timestamp()";

/// Bid insert
pub const INSERT_BID: &str =
    "INSERT INTO bids (auction_id, bidder_name, amount, bid_time) VALUES ($1, $2, $3, $4)";

/// Administrator decision, only from pending
pub const CONDITIONAL_STATUS: &str = r#"
    UPDATE auctions
    SET status = $1, version = version + 1
    WHERE id = $2 AND status = 'pending'
    RETURNING version
"#;

/// Event log append; (auction_id, version) is unique
pub const INSERT_EVENT: &str = r#"
    INSERT INTO auction_events (auction_id, event_type, data, timestamp, version)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (auction_id, version) DO NOTHING
    RETURNING id
"#;
