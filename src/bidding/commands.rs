/// 경매 커맨드 처리
/// 1. 경매 생성 / 예약 / 시작 / 종료 / 취소
/// 2. 입찰
/// 3. 즉시 구매
/// 모든 변경 커맨드는 애그리게잇을 로드해 전이를 실행하고 CAS 저장 후 이벤트를 발행한다
/// 버전 충돌 시 처음부터 다시 읽고 재평가한다 — 낡은 계산값을 재적용하지 않는다
// region:    --- Imports
use crate::auction::bid::Capability;
use crate::auction::clock::Clock;
use crate::auction::error::{DomainError, EngineError};
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Auction, AuctionType, NewAuction};
use crate::auction::money::{Currency, Money};
use crate::auction::settings::AuctionSettings;
use crate::event_dispatch::EventDispatcher;
use crate::repository::{AuctionRepository, RepoError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 경매 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub title: String,
    pub description: Option<String>,
    pub auction_type: AuctionType,
    pub vehicle_id: i64,
    pub seller_id: i64,
    pub starting_price: Decimal,
    pub currency: Currency,
    pub reserve_price: Option<Decimal>,
    pub buy_now_price: Option<Decimal>,
    pub settings: Option<AuctionSettings>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_dealer_only: bool,
}

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub is_proxy: bool,
    pub max_proxy_amount: Option<Decimal>,
    /// 호출자(인증 계층)가 판정한 입찰자 역할 태그
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// 즉시 구매 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuyNowCommand {
    pub auction_id: i64,
    pub buyer_id: i64,
}

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;

// endregion: --- Commands

// region:    --- Command Execution

/// 로드 -> 전이 -> CAS 저장 -> 이벤트 발행
/// 버전 충돌이면 다시 읽고 전이를 처음부터 재평가한다
async fn mutate_auction<T, F>(
    auction_id: i64,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    occurred_at: DateTime<Utc>,
    transition: F,
) -> Result<T, EngineError>
where
    F: Fn(&mut Auction) -> Result<T, DomainError>,
{
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let versioned = repo.load(auction_id).await?;
        let mut auction = versioned.auction;

        let outcome = transition(&mut auction)?;
        let events = auction.take_events();

        match repo.save(&auction.snapshot(), versioned.version).await {
            Ok(new_version) => {
                dispatch_events(dispatcher, auction_id, new_version, &events, occurred_at).await;
                return Ok(outcome);
            }
            Err(RepoError::VersionConflict(_)) => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DomainError::RetriesExhausted.into())
}

/// 커밋 이후 발행: 실패해도 커밋은 유지되고 로그만 남는다
async fn dispatch_events(
    dispatcher: &dyn EventDispatcher,
    aggregate_id: i64,
    version: i64,
    events: &[AuctionEvent],
    occurred_at: DateTime<Utc>,
) {
    if events.is_empty() {
        return;
    }
    if let Err(e) = dispatcher
        .dispatch(aggregate_id, version, events, occurred_at)
        .await
    {
        error!("{:<12} --> 이벤트 발행 실패 (경매 {}): {}", "Command", aggregate_id, e);
    }
}

// endregion: --- Command Execution

// region:    --- Command Handlers

/// 경매 생성
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<i64, EngineError> {
    info!("{:<12} --> 경매 생성 요청 처리 시작: {:?}", "Command", cmd);

    let starting_price = Money::new(cmd.starting_price, cmd.currency)?;
    let reserve_price = cmd
        .reserve_price
        .map(|v| Money::new(v, cmd.currency))
        .transpose()?;
    let buy_now_price = cmd
        .buy_now_price
        .map(|v| Money::new(v, cmd.currency))
        .transpose()?;

    let mut auction = Auction::create(NewAuction {
        title: cmd.title,
        description: cmd.description.unwrap_or_default(),
        auction_type: cmd.auction_type,
        vehicle_id: cmd.vehicle_id,
        seller_id: cmd.seller_id,
        starting_price,
        reserve_price,
        buy_now_price,
        settings: cmd.settings,
        start_time: cmd.start_time,
        end_time: cmd.end_time,
        is_dealer_only: cmd.is_dealer_only,
    })?;

    let events = auction.take_events();
    let auction_id = repo.insert(auction.snapshot()).await?;
    dispatch_events(dispatcher, auction_id, 1, &events, clock.now()).await;

    info!("{:<12} --> 경매 생성 완료: {}", "Command", auction_id);
    Ok(auction_id)
}

/// 경매 예약 (Draft -> Scheduled)
pub async fn handle_schedule_auction(
    auction_id: i64,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<(), EngineError> {
    info!("{:<12} --> 경매 예약 요청: {}", "Command", auction_id);
    mutate_auction(auction_id, repo, dispatcher, clock.now(), |auction| {
        auction.schedule()
    })
    .await
}

/// 경매 시작 (Scheduled -> Active)
pub async fn handle_start_auction(
    auction_id: i64,
    now: DateTime<Utc>,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
) -> Result<(), EngineError> {
    info!("{:<12} --> 경매 시작 요청: {}", "Command", auction_id);
    mutate_auction(auction_id, repo, dispatcher, now, |auction| {
        auction.start(now)
    })
    .await
}

/// 경매 종료 (Active -> Completed | EndedNoSale)
pub async fn handle_close_auction(
    auction_id: i64,
    now: DateTime<Utc>,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
) -> Result<(), EngineError> {
    info!("{:<12} --> 경매 종료 요청: {}", "Command", auction_id);
    mutate_auction(auction_id, repo, dispatcher, now, |auction| {
        auction.close(now)
    })
    .await
}

/// 경매 취소
pub async fn handle_cancel_auction(
    auction_id: i64,
    reason: String,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<(), EngineError> {
    info!(
        "{:<12} --> 경매 취소 요청: {} ({})",
        "Command", auction_id, reason
    );
    mutate_auction(auction_id, repo, dispatcher, clock.now(), move |auction| {
        auction.cancel(&reason)
    })
    .await
}

/// 입찰
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<i64, EngineError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let amount = Money::new(cmd.amount, cmd.currency)?;
    let max_proxy_amount = match (cmd.is_proxy, cmd.max_proxy_amount) {
        (true, Some(ceiling)) => Some(Money::new(ceiling, cmd.currency)?),
        (false, None) => None,
        // 플래그와 상한은 함께 와야 한다
        (true, None) | (false, Some(_)) => {
            return Err(DomainError::InvalidProxyCeiling.into());
        }
    };
    let is_dealer_eligible = cmd.capabilities.contains(&Capability::Dealer);

    // 재시도마다 입찰 시각을 다시 읽는다
    mutate_auction(cmd.auction_id, repo, dispatcher, clock.now(), move |auction| {
        auction.place_bid(
            cmd.bidder_id,
            amount,
            clock.now(),
            max_proxy_amount,
            is_dealer_eligible,
        )
    })
    .await
}

/// 즉시 구매 (낙찰)
pub async fn handle_buy_now(
    cmd: BuyNowCommand,
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<i64, EngineError> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);

    mutate_auction(cmd.auction_id, repo, dispatcher, clock.now(), move |auction| {
        auction.accept_buy_now(cmd.buyer_id, clock.now())
    })
    .await
}

// endregion: --- Command Handlers
