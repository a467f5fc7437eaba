use crate::auction::bid::{Bid, BidStatus};
use crate::auction::model::{AuctionSnapshot, AuctionStatus, AuctionType};
use crate::auction::money::{Currency, Money};
use crate::auction::settings::AuctionSettings;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 경매 행 모델 (auctions 테이블)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuctionRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub auction_type: String,
    pub status: String,
    pub vehicle_id: i64,
    pub seller_id: i64,
    pub currency: String,
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    pub buy_now_price: Option<Decimal>,
    pub current_high_bid: Decimal,
    pub winning_bid_id: Option<i64>,
    pub winning_bidder_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub is_dealer_only: bool,
    pub bid_count: i32,
    pub extension_count: i32,
    pub anti_sniping_window_secs: i64,
    pub anti_sniping_extension_secs: i64,
    pub minimum_bid_increment: Decimal,
    pub allow_proxy_bidding: bool,
    pub max_extensions: i32,
    pub require_deposit: bool,
    pub deposit_amount: Option<Decimal>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

// 입찰 행 모델 (bids 테이블)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidRow {
    pub auction_id: i64,
    pub id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub is_proxy_bid: bool,
    pub max_proxy_amount: Option<Decimal>,
}

impl AuctionRow {
    /// 행 -> 애그리게잇 스냅샷 복원
    pub fn into_snapshot(self, bid_rows: Vec<BidRow>) -> Result<AuctionSnapshot, String> {
        let currency = Currency::from_str(&self.currency)
            .ok_or_else(|| format!("알 수 없는 통화: {}", self.currency))?;
        let auction_type = AuctionType::from_str(&self.auction_type)
            .ok_or_else(|| format!("알 수 없는 경매 유형: {}", self.auction_type))?;
        let status = AuctionStatus::from_str(&self.status)
            .ok_or_else(|| format!("알 수 없는 경매 상태: {}", self.status))?;

        let mut bids = Vec::with_capacity(bid_rows.len());
        for row in bid_rows {
            bids.push(row.into_bid(currency)?);
        }

        Ok(AuctionSnapshot {
            id: self.id,
            title: self.title,
            description: self.description,
            auction_type,
            status,
            vehicle_id: self.vehicle_id,
            seller_id: self.seller_id,
            starting_price: Money::from_parts(self.starting_price, currency),
            reserve_price: self.reserve_price.map(|v| Money::from_parts(v, currency)),
            buy_now_price: self.buy_now_price.map(|v| Money::from_parts(v, currency)),
            current_high_bid: Money::from_parts(self.current_high_bid, currency),
            winning_bid_id: self.winning_bid_id,
            winning_bidder_id: self.winning_bidder_id,
            settings: AuctionSettings {
                anti_sniping_window: Duration::seconds(self.anti_sniping_window_secs),
                anti_sniping_extension: Duration::seconds(self.anti_sniping_extension_secs),
                minimum_bid_increment: Money::from_parts(self.minimum_bid_increment, currency),
                allow_proxy_bidding: self.allow_proxy_bidding,
                max_extensions: self.max_extensions.max(0) as u32,
                require_deposit: self.require_deposit,
                deposit_amount: self.deposit_amount.map(|v| Money::from_parts(v, currency)),
            },
            start_time: self.start_time,
            end_time: self.end_time,
            actual_end_time: self.actual_end_time,
            is_dealer_only: self.is_dealer_only,
            bid_count: self.bid_count.max(0) as u32,
            extension_count: self.extension_count.max(0) as u32,
            bids,
        })
    }
}

impl BidRow {
    /// 행 -> 입찰 복원 (통화는 경매 행에서 온다)
    pub fn into_bid(self, currency: Currency) -> Result<Bid, String> {
        let status = BidStatus::from_str(&self.status)
            .ok_or_else(|| format!("알 수 없는 입찰 상태: {}", self.status))?;
        Ok(Bid {
            id: self.id,
            auction_id: self.auction_id,
            bidder_id: self.bidder_id,
            amount: Money::from_parts(self.amount, currency),
            status,
            placed_at: self.placed_at,
            is_proxy_bid: self.is_proxy_bid,
            max_proxy_amount: self.max_proxy_amount.map(|v| Money::from_parts(v, currency)),
        })
    }
}
