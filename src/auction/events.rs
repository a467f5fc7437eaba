use crate::auction::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 경매 도메인 이벤트
/// 각 상태 전이가 성공한 곳에서만 발생하며, 커밋 이후 외부로 발행된다
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 경매 생성 이벤트
    AuctionCreated {
        title: String,
        seller_id: i64,
        vehicle_id: i64,
        starting_price: Money,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    // 경매 예약 이벤트
    AuctionScheduled {
        start_time: DateTime<Utc>,
    },
    // 경매 시작 이벤트
    AuctionStarted {
        started_at: DateTime<Utc>,
    },
    // 스나이핑 방지 연장 이벤트
    AuctionExtended {
        new_end_time: DateTime<Utc>,
        extension_count: u32,
    },
    // 입찰 이벤트
    BidPlacedOnAuction {
        bid_id: i64,
        bidder_id: i64,
        amount: Money,
    },
    // 상회 입찰 발생 이벤트
    BidOutbid {
        bid_id: i64,
        bidder_id: i64,
    },
    // 낙찰 이벤트
    BidWon {
        bid_id: i64,
        bidder_id: i64,
        amount: Money,
    },
    // 경매 완료 이벤트
    AuctionCompleted {
        winner_id: i64,
        final_price: Money,
        was_buy_now: bool,
    },
    // 유찰 이벤트
    AuctionEndedNoSale {
        highest_bid: Option<Money>,
        reserve_price: Option<Money>,
    },
    // 경매 취소 이벤트
    AuctionCancelled {
        reason: String,
    },
}

impl AuctionEvent {
    /// 발행 봉투에 쓰는 이벤트 타입 이름
    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionCreated { .. } => "AuctionCreated",
            AuctionEvent::AuctionScheduled { .. } => "AuctionScheduled",
            AuctionEvent::AuctionStarted { .. } => "AuctionStarted",
            AuctionEvent::AuctionExtended { .. } => "AuctionExtended",
            AuctionEvent::BidPlacedOnAuction { .. } => "BidPlacedOnAuction",
            AuctionEvent::BidOutbid { .. } => "BidOutbid",
            AuctionEvent::BidWon { .. } => "BidWon",
            AuctionEvent::AuctionCompleted { .. } => "AuctionCompleted",
            AuctionEvent::AuctionEndedNoSale { .. } => "AuctionEndedNoSale",
            AuctionEvent::AuctionCancelled { .. } => "AuctionCancelled",
        }
    }
}
