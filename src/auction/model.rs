/// 경매 애그리게잇
/// 모든 상태 전이와 입찰 불변식은 이 타입을 통해서만 지나간다
/// 1. current_high_bid 는 단조 증가
/// 2. extension_count <= settings.max_extensions
/// 3. winning_bidder_id != seller_id
/// 4. 한 경매의 모든 금액은 같은 통화
/// 5. 거부된 커맨드는 아무 필드도 바꾸지 않는다
// region:    --- Imports
use crate::auction::bid::{Bid, BidStatus};
use crate::auction::error::DomainError;
use crate::auction::events::AuctionEvent;
use crate::auction::money::{Currency, Money};
use crate::auction::settings::AuctionSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Status / Type

/// 경매 수명주기 상태
/// Completed / EndedNoSale / Cancelled 는 최종 상태로 이후 어떤 변경도 불가
/// Paused 는 외부 운영 도구만 만드는 상태로, 코어 전이는 이를 생성하지 않는다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Draft,
    Scheduled,
    Active,
    Completed,
    EndedNoSale,
    Cancelled,
    Paused,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Draft => "DRAFT",
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Completed => "COMPLETED",
            AuctionStatus::EndedNoSale => "ENDED_NO_SALE",
            AuctionStatus::Cancelled => "CANCELLED",
            AuctionStatus::Paused => "PAUSED",
        }
    }

    pub fn from_str(s: &str) -> Option<AuctionStatus> {
        match s {
            "DRAFT" => Some(AuctionStatus::Draft),
            "SCHEDULED" => Some(AuctionStatus::Scheduled),
            "ACTIVE" => Some(AuctionStatus::Active),
            "COMPLETED" => Some(AuctionStatus::Completed),
            "ENDED_NO_SALE" => Some(AuctionStatus::EndedNoSale),
            "CANCELLED" => Some(AuctionStatus::Cancelled),
            "PAUSED" => Some(AuctionStatus::Paused),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuctionStatus::Completed | AuctionStatus::EndedNoSale | AuctionStatus::Cancelled
        )
    }
}

/// 경매 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionType {
    Live,
    Timed,
    BuyNow,
    SealedBid,
}

impl AuctionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionType::Live => "LIVE",
            AuctionType::Timed => "TIMED",
            AuctionType::BuyNow => "BUY_NOW",
            AuctionType::SealedBid => "SEALED_BID",
        }
    }

    pub fn from_str(s: &str) -> Option<AuctionType> {
        match s {
            "LIVE" => Some(AuctionType::Live),
            "TIMED" => Some(AuctionType::Timed),
            "BUY_NOW" => Some(AuctionType::BuyNow),
            "SEALED_BID" => Some(AuctionType::SealedBid),
            _ => None,
        }
    }
}

// endregion: --- Status / Type

// region:    --- New Auction

/// 경매 생성 인자
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub title: String,
    pub description: String,
    pub auction_type: AuctionType,
    pub vehicle_id: i64,
    pub seller_id: i64,
    pub starting_price: Money,
    pub reserve_price: Option<Money>,
    pub buy_now_price: Option<Money>,
    pub settings: Option<AuctionSettings>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_dealer_only: bool,
}

// endregion: --- New Auction

// region:    --- Snapshot

/// 저장소 경계용 스냅샷: 도메인 ↔ 저장소 변환에 쓴다
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub auction_type: AuctionType,
    pub status: AuctionStatus,
    pub vehicle_id: i64,
    pub seller_id: i64,
    pub starting_price: Money,
    pub reserve_price: Option<Money>,
    pub buy_now_price: Option<Money>,
    pub current_high_bid: Money,
    pub winning_bid_id: Option<i64>,
    pub winning_bidder_id: Option<i64>,
    pub settings: AuctionSettings,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub is_dealer_only: bool,
    pub bid_count: u32,
    pub extension_count: u32,
    pub bids: Vec<Bid>,
}

// endregion: --- Snapshot

// region:    --- Auction

pub struct Auction {
    id: i64,
    title: String,
    description: String,
    auction_type: AuctionType,
    status: AuctionStatus,
    vehicle_id: i64,
    seller_id: i64,
    starting_price: Money,
    reserve_price: Option<Money>,
    buy_now_price: Option<Money>,
    current_high_bid: Money,
    winning_bid_id: Option<i64>,
    winning_bidder_id: Option<i64>,
    settings: AuctionSettings,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    actual_end_time: Option<DateTime<Utc>>,
    is_dealer_only: bool,
    bid_count: u32,
    extension_count: u32,
    bids: Vec<Bid>,
    // 전이 중 쌓이는 이벤트: 커밋 후 take_events 로 배출
    events: Vec<AuctionEvent>,
}

impl Auction {
    /// 경매 생성 (Draft)
    pub fn create(params: NewAuction) -> Result<Auction, DomainError> {
        if params.end_time <= params.start_time {
            return Err(DomainError::InvalidSchedule);
        }
        let currency = params.starting_price.currency();
        if let Some(reserve) = &params.reserve_price {
            if reserve.currency() != currency {
                return Err(DomainError::CurrencyMismatch {
                    expected: currency,
                    actual: reserve.currency(),
                });
            }
        }
        if let Some(buy_now) = &params.buy_now_price {
            if buy_now.currency() != currency {
                return Err(DomainError::CurrencyMismatch {
                    expected: currency,
                    actual: buy_now.currency(),
                });
            }
        }
        let settings = params
            .settings
            .unwrap_or_else(|| AuctionSettings::default_for(currency));
        settings.validate(currency)?;

        let mut auction = Auction {
            id: 0,
            title: params.title,
            description: params.description,
            auction_type: params.auction_type,
            status: AuctionStatus::Draft,
            vehicle_id: params.vehicle_id,
            seller_id: params.seller_id,
            starting_price: params.starting_price,
            reserve_price: params.reserve_price,
            buy_now_price: params.buy_now_price,
            current_high_bid: Money::zero(currency),
            winning_bid_id: None,
            winning_bidder_id: None,
            settings,
            start_time: params.start_time,
            end_time: params.end_time,
            actual_end_time: None,
            is_dealer_only: params.is_dealer_only,
            bid_count: 0,
            extension_count: 0,
            bids: Vec::new(),
            events: Vec::new(),
        };
        auction.events.push(AuctionEvent::AuctionCreated {
            title: auction.title.clone(),
            seller_id: auction.seller_id,
            vehicle_id: auction.vehicle_id,
            starting_price: auction.starting_price,
            start_time: auction.start_time,
            end_time: auction.end_time,
        });
        Ok(auction)
    }

    /// Draft -> Scheduled
    pub fn schedule(&mut self) -> Result<(), DomainError> {
        if self.status != AuctionStatus::Draft {
            return Err(DomainError::InvalidStatus { status: self.status });
        }
        self.status = AuctionStatus::Scheduled;
        self.events.push(AuctionEvent::AuctionScheduled {
            start_time: self.start_time,
        });
        Ok(())
    }

    /// Scheduled -> Active (시작 시간이 되어야 한다)
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != AuctionStatus::Scheduled {
            return Err(DomainError::InvalidStatus { status: self.status });
        }
        if now < self.start_time {
            return Err(DomainError::NotStarted);
        }
        self.status = AuctionStatus::Active;
        self.events
            .push(AuctionEvent::AuctionStarted { started_at: now });
        Ok(())
    }

    /// 입찰 접수
    /// 모든 검증을 통과해야만 상태를 바꾼다; 하나라도 실패하면 아무것도 변하지 않는다
    pub fn place_bid(
        &mut self,
        bidder_id: i64,
        amount: Money,
        bid_time: DateTime<Utc>,
        max_proxy_amount: Option<Money>,
        is_dealer_eligible: bool,
    ) -> Result<i64, DomainError> {
        // 1. Active 상태이고 아직 종료 시간 전이어야 한다
        self.ensure_open_for_sale()?;
        if bid_time > self.end_time {
            return Err(DomainError::AlreadyEnded);
        }
        // 2. 판매자 본인 입찰 금지
        if bidder_id == self.seller_id {
            return Err(DomainError::SellerSelfBid);
        }
        // 3. 딜러 전용 경매 자격 확인 (자격 판정은 호출자 몫)
        if self.is_dealer_only && !is_dealer_eligible {
            return Err(DomainError::DealerOnlyAuction);
        }
        // 4. 통화 일치
        if amount.currency() != self.currency() {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency(),
                actual: amount.currency(),
            });
        }
        // 5. 프록시 인자 검증
        if let Some(ceiling) = &max_proxy_amount {
            if !self.settings.allow_proxy_bidding {
                return Err(DomainError::ProxyBiddingNotAllowed);
            }
            if ceiling.currency() != self.currency() {
                return Err(DomainError::CurrencyMismatch {
                    expected: self.currency(),
                    actual: ceiling.currency(),
                });
            }
            if *ceiling <= amount {
                return Err(DomainError::InvalidProxyCeiling);
            }
        }
        // 6. 최소 입찰가: 첫 입찰은 시작가, 이후는 현재가 + 최소 증가액 (동액 허용)
        let minimum = self.minimum_acceptable_bid();
        if amount < minimum {
            return Err(DomainError::BidBelowMinimum {
                offered: amount,
                minimum,
            });
        }
        // 7. 스나이핑 방지: 종료 직전 입찰이면 입찰 시각 기준으로 종료 시간을 연장
        //    (연장 횟수 상한 내에서; 마감 임박 입찰 뒤에도 연장 시간만큼의 경쟁 기회를 보장)
        if self.end_time - bid_time <= self.settings.anti_sniping_window
            && self.extension_count < self.settings.max_extensions
        {
            self.end_time = bid_time + self.settings.anti_sniping_extension;
            self.extension_count += 1;
            self.events.push(AuctionEvent::AuctionExtended {
                new_end_time: self.end_time,
                extension_count: self.extension_count,
            });
        }
        // 8. 기존 선두를 Outbid 처리하고 새 입찰을 선두로 기록
        if let Some(prev_id) = self.winning_bid_id {
            self.mark_outbid(prev_id);
        }
        let bid_id = self.bids.len() as i64 + 1;
        let bid = Bid::place(bid_id, self.id, bidder_id, amount, bid_time, max_proxy_amount);
        self.bids.push(bid);
        self.current_high_bid = amount;
        self.winning_bid_id = Some(bid_id);
        self.winning_bidder_id = Some(bidder_id);
        self.bid_count += 1;
        self.events.push(AuctionEvent::BidPlacedOnAuction {
            bid_id,
            bidder_id,
            amount,
        });
        // 9. 프록시 자동 증액 경쟁을 고정점까지 해소
        self.resolve_proxy_bids();
        Ok(bid_id)
    }

    /// 즉시 구매 수락: end_time 과 무관하게 그 자리에서 Completed 로 종료
    pub fn accept_buy_now(&mut self, buyer_id: i64, now: DateTime<Utc>) -> Result<i64, DomainError> {
        self.ensure_open_for_sale()?;
        if now > self.end_time {
            return Err(DomainError::AlreadyEnded);
        }
        let buy_now_price = self.buy_now_price.ok_or(DomainError::BuyNowUnavailable)?;
        if buyer_id == self.seller_id {
            return Err(DomainError::SellerSelfBid);
        }
        // 입찰 경쟁이 이미 즉시 구매 가격에 도달했으면 수락 불가 (현재가는 내려갈 수 없다)
        if self.bid_count > 0 && self.current_high_bid >= buy_now_price {
            return Err(DomainError::BuyNowOvertaken);
        }
        if let Some(prev_id) = self.winning_bid_id {
            self.mark_outbid(prev_id);
        }
        let bid_id = self.bids.len() as i64 + 1;
        let bid = Bid::place(bid_id, self.id, buyer_id, buy_now_price, now, None);
        self.bids.push(bid);
        self.current_high_bid = buy_now_price;
        self.winning_bid_id = Some(bid_id);
        self.winning_bidder_id = Some(buyer_id);
        self.bid_count += 1;
        self.status = AuctionStatus::Completed;
        self.actual_end_time = Some(now);
        self.events.push(AuctionEvent::BidWon {
            bid_id,
            bidder_id: buyer_id,
            amount: buy_now_price,
        });
        self.events.push(AuctionEvent::AuctionCompleted {
            winner_id: buyer_id,
            final_price: buy_now_price,
            was_buy_now: true,
        });
        Ok(bid_id)
    }

    /// 종료 처리: 낙찰 또는 유찰
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_open_for_sale()?;
        if now < self.end_time {
            return Err(DomainError::NotEnded);
        }
        self.actual_end_time = Some(now);
        match (self.winning_bid_id, self.winning_bidder_id) {
            (Some(bid_id), Some(bidder_id)) if self.meets_reserve() => {
                self.status = AuctionStatus::Completed;
                self.events.push(AuctionEvent::BidWon {
                    bid_id,
                    bidder_id,
                    amount: self.current_high_bid,
                });
                self.events.push(AuctionEvent::AuctionCompleted {
                    winner_id: bidder_id,
                    final_price: self.current_high_bid,
                    was_buy_now: false,
                });
            }
            _ => {
                // 입찰이 없거나 최저 낙찰가 미달: 낙찰자 없이 종료
                self.status = AuctionStatus::EndedNoSale;
                let highest_bid = (self.bid_count > 0).then_some(self.current_high_bid);
                self.winning_bid_id = None;
                self.winning_bidder_id = None;
                self.events.push(AuctionEvent::AuctionEndedNoSale {
                    highest_bid,
                    reserve_price: self.reserve_price,
                });
            }
        }
        Ok(())
    }

    /// 취소: 최종 상태가 아니면 언제든 가능
    pub fn cancel(&mut self, reason: &str) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStatus { status: self.status });
        }
        self.status = AuctionStatus::Cancelled;
        self.events.push(AuctionEvent::AuctionCancelled {
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// 최저 낙찰가 충족 여부 (미설정이면 항상 충족)
    pub fn meets_reserve(&self) -> bool {
        match &self.reserve_price {
            Some(reserve) => self.current_high_bid >= *reserve,
            None => true,
        }
    }

    /// 다음 입찰이 넘어야 하는 금액
    pub fn minimum_acceptable_bid(&self) -> Money {
        if self.bid_count == 0 {
            self.starting_price
        } else {
            self.current_high_bid + self.settings.minimum_bid_increment
        }
    }

    /// 입찰 전 보증금 (결제 협력자가 징수)
    pub fn required_deposit(&self) -> Option<Money> {
        if self.settings.require_deposit {
            self.settings.deposit_amount
        } else {
            None
        }
    }

    /// 쌓인 도메인 이벤트 배출 (커밋 성공 후 트랜잭션 경계에서 호출)
    pub fn take_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.events)
    }

    // 입찰/즉시구매 공통 상태 가드
    fn ensure_open_for_sale(&self) -> Result<(), DomainError> {
        match self.status {
            AuctionStatus::Active => Ok(()),
            AuctionStatus::Draft | AuctionStatus::Scheduled => Err(DomainError::NotStarted),
            AuctionStatus::Completed | AuctionStatus::EndedNoSale | AuctionStatus::Cancelled => {
                Err(DomainError::AlreadyEnded)
            }
            AuctionStatus::Paused => Err(DomainError::InvalidStatus { status: self.status }),
        }
    }

    fn mark_outbid(&mut self, bid_id: i64) {
        if let Some(bid) = self.bids.iter_mut().find(|b| b.id == bid_id) {
            if bid.status == BidStatus::Winning {
                bid.status = BidStatus::Outbid;
                self.events.push(AuctionEvent::BidOutbid {
                    bid_id: bid.id,
                    bidder_id: bid.bidder_id,
                });
            }
        }
    }

    /// 프록시 입찰 전쟁 해소
    /// 선두가 아닌 프록시 중 상한이 (현재가 + 증가액) 이상인 것이 남아 있는 동안,
    /// 상한이 가장 높은 것(동률이면 먼저 도착한 것)을 최소 증가폭으로 올려 선두로 세운다
    /// 자동 증액은 bid_count 와 스나이핑 연장에 영향을 주지 않는다
    fn resolve_proxy_bids(&mut self) {
        if !self.settings.allow_proxy_bidding {
            return;
        }
        loop {
            let required = self.current_high_bid + self.settings.minimum_bid_increment;
            let candidate = self
                .bids
                .iter()
                .filter(|b| Some(b.id) != self.winning_bid_id && b.can_be_auto_bid(&required))
                .max_by(|a, b| {
                    a.proxy_ceiling_amount()
                        .cmp(&b.proxy_ceiling_amount())
                        .then(b.id.cmp(&a.id))
                })
                .map(|b| b.id);
            let Some(bid_id) = candidate else { break };

            if let Some(prev_id) = self.winning_bid_id {
                self.mark_outbid(prev_id);
            }
            if let Some(bid) = self.bids.iter_mut().find(|b| b.id == bid_id) {
                bid.increment_to(required);
                bid.status = BidStatus::Winning;
                self.current_high_bid = bid.amount;
                self.winning_bid_id = Some(bid.id);
                self.winning_bidder_id = Some(bid.bidder_id);
            }
        }
    }

    // region:    --- Accessors

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn auction_type(&self) -> AuctionType {
        self.auction_type
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn vehicle_id(&self) -> i64 {
        self.vehicle_id
    }

    pub fn seller_id(&self) -> i64 {
        self.seller_id
    }

    pub fn currency(&self) -> Currency {
        self.starting_price.currency()
    }

    pub fn starting_price(&self) -> Money {
        self.starting_price
    }

    pub fn reserve_price(&self) -> Option<Money> {
        self.reserve_price
    }

    pub fn buy_now_price(&self) -> Option<Money> {
        self.buy_now_price
    }

    pub fn current_high_bid(&self) -> Money {
        self.current_high_bid
    }

    pub fn winning_bid_id(&self) -> Option<i64> {
        self.winning_bid_id
    }

    pub fn winning_bidder_id(&self) -> Option<i64> {
        self.winning_bidder_id
    }

    pub fn settings(&self) -> &AuctionSettings {
        &self.settings
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn actual_end_time(&self) -> Option<DateTime<Utc>> {
        self.actual_end_time
    }

    pub fn is_dealer_only(&self) -> bool {
        self.is_dealer_only
    }

    pub fn bid_count(&self) -> u32 {
        self.bid_count
    }

    pub fn extension_count(&self) -> u32 {
        self.extension_count
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    // endregion: --- Accessors

    // region:    --- Snapshot / Restore

    /// 저장용 스냅샷 (이벤트 버퍼는 포함하지 않는다)
    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            auction_type: self.auction_type,
            status: self.status,
            vehicle_id: self.vehicle_id,
            seller_id: self.seller_id,
            starting_price: self.starting_price,
            reserve_price: self.reserve_price,
            buy_now_price: self.buy_now_price,
            current_high_bid: self.current_high_bid,
            winning_bid_id: self.winning_bid_id,
            winning_bidder_id: self.winning_bidder_id,
            settings: self.settings,
            start_time: self.start_time,
            end_time: self.end_time,
            actual_end_time: self.actual_end_time,
            is_dealer_only: self.is_dealer_only,
            bid_count: self.bid_count,
            extension_count: self.extension_count,
            bids: self.bids.clone(),
        }
    }

    /// 스냅샷에서 복원
    pub fn restore(snapshot: AuctionSnapshot) -> Auction {
        Auction {
            id: snapshot.id,
            title: snapshot.title,
            description: snapshot.description,
            auction_type: snapshot.auction_type,
            status: snapshot.status,
            vehicle_id: snapshot.vehicle_id,
            seller_id: snapshot.seller_id,
            starting_price: snapshot.starting_price,
            reserve_price: snapshot.reserve_price,
            buy_now_price: snapshot.buy_now_price,
            current_high_bid: snapshot.current_high_bid,
            winning_bid_id: snapshot.winning_bid_id,
            winning_bidder_id: snapshot.winning_bidder_id,
            settings: snapshot.settings,
            start_time: snapshot.start_time,
            end_time: snapshot.end_time,
            actual_end_time: snapshot.actual_end_time,
            is_dealer_only: snapshot.is_dealer_only,
            bid_count: snapshot.bid_count,
            extension_count: snapshot.extension_count,
            bids: snapshot.bids,
            events: Vec::new(),
        }
    }

    // endregion: --- Snapshot / Restore
}

// endregion: --- Auction
