/// 경매 상태 조회
pub const GET_AUCTION_STATE: &str = "SELECT id, title, description, auction_type, status, vehicle_id, seller_id, currency, starting_price, reserve_price, buy_now_price, current_high_bid, winning_bid_id, winning_bidder_id, start_time, end_time, actual_end_time, is_dealer_only, bid_count, extension_count, anti_sniping_window_secs, anti_sniping_extension_secs, minimum_bid_increment, allow_proxy_bidding, max_extensions, require_deposit, deposit_amount, version, created_at FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = "SELECT id, title, description, auction_type, status, vehicle_id, seller_id, currency, starting_price, reserve_price, buy_now_price, current_high_bid, winning_bid_id, winning_bidder_id, start_time, end_time, actual_end_time, is_dealer_only, bid_count, extension_count, anti_sniping_window_secs, anti_sniping_extension_secs, minimum_bid_increment, allow_proxy_bidding, max_extensions, require_deposit, deposit_amount, version, created_at FROM auctions ORDER BY created_at DESC";

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str =
    "SELECT MAX(amount) as highest_bid FROM bids WHERE auction_id = $1";

/// 입찰 이력 조회
pub const GET_BID_HISTORY: &str = r#"
    SELECT auction_id, id, bidder_id, amount, status, placed_at, is_proxy_bid, max_proxy_amount
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at DESC, id DESC
"#;

/// 경매 현재 가격 조회
pub const GET_CURRENT_HIGH_BID: &str = "SELECT current_high_bid FROM auctions WHERE id = $1";
