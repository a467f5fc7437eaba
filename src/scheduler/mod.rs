/// 경매 시간 조정 워커
/// 서로 독립적인 두 폴링 루프가 저장된 경매 상태만을 매개로 경매를 시간축 위에서 밀어 준다
/// - Starter: 시작 시간이 지난 Scheduled 경매를 Active 로 승격
/// - Timer: 종료 시간이 지난 Active 경매를 종료 처리
/// 두 루프 모두 애그리게잇의 검증된 진입점(Start/Close 커맨드)만 사용한다
/// 이미 전이된 경매의 Conflict 는 무해한 잡음으로 보고 넘어간다 (다중 레플리카 멱등성)
// region:    --- Imports
use crate::auction::clock::Clock;
use crate::auction::error::{EngineError, ErrorKind};
use crate::bidding::commands;
use crate::event_dispatch::EventDispatcher;
use crate::repository::{AuctionRepository, RepoError};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler

/// 폴링 간격 기본값 (초)
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// 경매 시간 조정 워커
pub struct AuctionScheduler {
    repo: Arc<dyn AuctionRepository>,
    dispatcher: Arc<dyn EventDispatcher>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl AuctionScheduler {
    pub fn new(
        repo: Arc<dyn AuctionRepository>,
        dispatcher: Arc<dyn EventDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let poll_interval = std::env::var("SCHEDULER_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Self {
            repo,
            dispatcher,
            clock,
            poll_interval: Duration::from_secs(poll_interval),
        }
    }

    /// 두 워커 루프 시작
    pub async fn start(&self) {
        // Starter 루프
        let repo = Arc::clone(&self.repo);
        let dispatcher = Arc::clone(&self.dispatcher);
        let clock = Arc::clone(&self.clock);
        let poll_interval = self.poll_interval;
        tokio::spawn(async move {
            let mut interval = interval(poll_interval);
            loop {
                interval.tick().await;
                if let Err(e) =
                    sweep_due_starts(repo.as_ref(), dispatcher.as_ref(), clock.as_ref()).await
                {
                    error!("{:<12} --> 스캔 중 오류 발생: {:?}", "Starter", e);
                }
            }
        });

        // Timer 루프
        let repo = Arc::clone(&self.repo);
        let dispatcher = Arc::clone(&self.dispatcher);
        let clock = Arc::clone(&self.clock);
        let poll_interval = self.poll_interval;
        tokio::spawn(async move {
            let mut interval = interval(poll_interval);
            loop {
                interval.tick().await;
                if let Err(e) =
                    sweep_due_closes(repo.as_ref(), dispatcher.as_ref(), clock.as_ref()).await
                {
                    error!("{:<12} --> 스캔 중 오류 발생: {:?}", "Timer", e);
                }
            }
        });
    }
}

// endregion: --- Auction Scheduler

// region:    --- Sweeps

/// Scheduled -> Active 승격 스캔
/// 개별 경매의 실패는 남은 경매 처리를 막지 않는다
pub async fn sweep_due_starts(
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<(), RepoError> {
    let now = clock.now();
    let due = repo.find_due_to_start(now).await?;
    for auction_id in due {
        match commands::handle_start_auction(auction_id, now, repo, dispatcher).await {
            Ok(()) => {
                info!("{:<12} --> 경매 시작: {}", "Starter", auction_id);
            }
            Err(EngineError::Domain(e)) if e.kind() == ErrorKind::Conflict => {
                // 다른 워커가 먼저 처리한 경매
                debug!("{:<12} --> 이미 전이된 경매 {}: {}", "Starter", auction_id, e);
            }
            Err(e) => {
                error!(
                    "{:<12} --> 경매 {} 시작 실패 (다음 주기에 재시도): {}",
                    "Starter", auction_id, e
                );
            }
        }
    }
    Ok(())
}

/// Active -> 종료 처리 스캔
pub async fn sweep_due_closes(
    repo: &dyn AuctionRepository,
    dispatcher: &dyn EventDispatcher,
    clock: &dyn Clock,
) -> Result<(), RepoError> {
    let now = clock.now();
    let due = repo.find_due_to_close(now).await?;
    for auction_id in due {
        match commands::handle_close_auction(auction_id, now, repo, dispatcher).await {
            Ok(()) => {
                info!("{:<12} --> 경매 종료: {}", "Timer", auction_id);
            }
            Err(EngineError::Domain(e)) if e.kind() == ErrorKind::Conflict => {
                // 다른 워커가 먼저 처리한 경매
                debug!("{:<12} --> 이미 전이된 경매 {}: {}", "Timer", auction_id, e);
            }
            Err(e) => {
                error!(
                    "{:<12} --> 경매 {} 종료 실패 (다음 주기에 재시도): {}",
                    "Timer", auction_id, e
                );
            }
        }
    }
    Ok(())
}

// endregion: --- Sweeps
