/// 입찰 모델
// region:    --- Imports
use crate::auction::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Bid Status

/// 입찰 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    Active,
    Outbid,
    Winning,
    Withdrawn,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Active => "ACTIVE",
            BidStatus::Outbid => "OUTBID",
            BidStatus::Winning => "WINNING",
            BidStatus::Withdrawn => "WITHDRAWN",
            BidStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<BidStatus> {
        match s {
            "ACTIVE" => Some(BidStatus::Active),
            "OUTBID" => Some(BidStatus::Outbid),
            "WINNING" => Some(BidStatus::Winning),
            "WITHDRAWN" => Some(BidStatus::Withdrawn),
            "REJECTED" => Some(BidStatus::Rejected),
            _ => None,
        }
    }
}

// endregion: --- Bid Status

// region:    --- Bid

/// 입찰: 경매 단위 일련번호(id)로 식별하며 삭제되지 않는다
/// 금액은 프록시 자동 증액 경로로만 증가할 수 있다
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: Money,
    pub status: BidStatus,
    pub placed_at: DateTime<Utc>,
    pub is_proxy_bid: bool,
    pub max_proxy_amount: Option<Money>,
}

impl Bid {
    /// 새 입찰 생성: 접수 즉시 선두가 된다
    pub(crate) fn place(
        id: i64,
        auction_id: i64,
        bidder_id: i64,
        amount: Money,
        placed_at: DateTime<Utc>,
        max_proxy_amount: Option<Money>,
    ) -> Bid {
        Bid {
            id,
            auction_id,
            bidder_id,
            amount,
            status: BidStatus::Winning,
            placed_at,
            is_proxy_bid: max_proxy_amount.is_some(),
            max_proxy_amount,
        }
    }

    /// 이 입찰이 `required` 금액까지 자동 증액으로 대응할 수 있는가
    pub fn can_be_auto_bid(&self, required: &Money) -> bool {
        if !self.is_proxy_bid {
            return false;
        }
        if matches!(self.status, BidStatus::Withdrawn | BidStatus::Rejected) {
            return false;
        }
        match &self.max_proxy_amount {
            Some(ceiling) => ceiling >= required,
            None => false,
        }
    }

    /// 프록시 상한을 넘지 않는 범위에서 증액
    pub(crate) fn increment_to(&mut self, target: Money) {
        if let Some(ceiling) = self.max_proxy_amount {
            self.amount = if target > ceiling { ceiling } else { target };
        }
    }

    /// 비교용 상한 금액 (프록시가 아니면 0)
    pub(crate) fn proxy_ceiling_amount(&self) -> Decimal {
        self.max_proxy_amount
            .as_ref()
            .map(|m| m.amount())
            .unwrap_or(Decimal::ZERO)
    }
}

// endregion: --- Bid

// region:    --- Capability

/// 입찰자 역할 태그: 비트마스크 대신 멤버십 검사로 평가한다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Capability {
    Dealer,
    Buyer,
    Seller,
}

// endregion: --- Capability
