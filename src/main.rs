// region:    --- Imports
use crate::auction::clock::{Clock, SystemClock};
use crate::database::DatabaseManager;
use crate::event_dispatch::{EventDispatcher, KafkaEventDispatcher, AUCTION_EVENTS_TOPIC};
use crate::handlers::AppState;
use crate::repository::postgres::PostgresAuctionRepository;
use crate::repository::AuctionRepository;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use message_broker::KafkaManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod database;
mod event_dispatch;
mod handlers;
mod message_broker;
mod query;
mod repository;
mod scheduler;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 이벤트 토픽 준비
    let kafka_manager = Arc::new(KafkaManager::new());
    kafka_manager.create_topic(AUCTION_EVENTS_TOPIC, 5, 1).await?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 코어 협력자 구성: 저장소 / 이벤트 발행 / 시계
    let repo: Arc<dyn AuctionRepository> =
        Arc::new(PostgresAuctionRepository::new(db_manager.get_pool()));
    let dispatcher: Arc<dyn EventDispatcher> =
        Arc::new(KafkaEventDispatcher::new(kafka_manager.get_producer()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 경매 시간 조정 워커 시작 (Starter / Timer)
    let auction_scheduler = scheduler::AuctionScheduler::new(
        Arc::clone(&repo),
        Arc::clone(&dispatcher),
        Arc::clone(&clock),
    );
    auction_scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 핸들러 공유 상태
    let state = AppState {
        db_manager: Arc::clone(&db_manager),
        repo,
        dispatcher,
        clock,
    };

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/auctions",
            post(handlers::handle_create_auction).get(handlers::handle_get_auctions),
        )
        .route(
            "/auctions/:id/schedule",
            post(handlers::handle_schedule_auction),
        )
        .route("/auctions/:id/start", post(handlers::handle_start_auction))
        .route("/auctions/:id/close", post(handlers::handle_close_auction))
        .route("/auctions/:id/cancel", post(handlers::handle_cancel_auction))
        .route("/bid", post(handlers::handle_bid))
        .route("/buy-now", post(handlers::handle_buy_now))
        .route("/auctions/:id", get(handlers::handle_get_auction_state))
        .route(
            "/auctions/:id/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .route("/auctions/:id/bids", get(handlers::handle_get_bid_history))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 동시성을 위한 바디 사이즈 10배 증가(20MB)
        .with_state(state);

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
