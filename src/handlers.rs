// region:    --- Imports
use crate::auction::clock::Clock;
use crate::auction::error::{EngineError, ErrorKind};
use crate::bidding::commands::{
    handle_buy_now as command_handle_buy_now, handle_cancel_auction as command_handle_cancel,
    handle_close_auction as command_handle_close, handle_create_auction as command_handle_create,
    handle_place_bid, handle_schedule_auction as command_handle_schedule,
    handle_start_auction as command_handle_start, BuyNowCommand, CreateAuctionCommand,
    PlaceBidCommand,
};
use crate::database::DatabaseManager;
use crate::event_dispatch::EventDispatcher;
use crate::query;
use crate::repository::AuctionRepository;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db_manager: Arc<DatabaseManager>,
    pub repo: Arc<dyn AuctionRepository>,
    pub dispatcher: Arc<dyn EventDispatcher>,
    pub clock: Arc<dyn Clock>,
}

/// 커맨드 거부를 HTTP 응답으로 변환
/// Validation -> 400, Conflict -> 409, 저장소 장애 -> 500
fn engine_error_response(e: EngineError) -> Response {
    match e {
        EngineError::Domain(e) => {
            let status = match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
            };
            (
                status,
                Json(serde_json::json!({"error": e.to_string(), "code": e.code()})),
            )
                .into_response()
        }
        EngineError::Storage(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": msg, "code": "STORAGE"})),
        )
            .into_response(),
    }
}

// endregion: --- App State

// region:    --- Command Handlers

/// 경매 생성 요청 처리
pub async fn handle_create_auction(
    State(state): State<AppState>,
    Json(cmd): Json<CreateAuctionCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 생성 요청 처리 시작: {:?}", "Command", cmd);

    match command_handle_create(
        cmd,
        state.repo.as_ref(),
        state.dispatcher.as_ref(),
        state.clock.as_ref(),
    )
    .await
    {
        Ok(auction_id) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "경매가 성공적으로 생성되었습니다.",
                "auction_id": auction_id
            })),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// 경매 예약 요청 처리
pub async fn handle_schedule_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match command_handle_schedule(
        auction_id,
        state.repo.as_ref(),
        state.dispatcher.as_ref(),
        state.clock.as_ref(),
    )
    .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "경매가 예약되었습니다.", "auction_id": auction_id})),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// 경매 시작 요청 처리 (운영자용 — 평시에는 Starter 워커가 처리)
pub async fn handle_start_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    let now = state.clock.now();
    match command_handle_start(auction_id, now, state.repo.as_ref(), state.dispatcher.as_ref())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "경매가 시작되었습니다.", "auction_id": auction_id})),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// 경매 종료 요청 처리 (운영자용 — 평시에는 Timer 워커가 처리)
pub async fn handle_close_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    let now = state.clock.now();
    match command_handle_close(auction_id, now, state.repo.as_ref(), state.dispatcher.as_ref())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "경매가 종료되었습니다.", "auction_id": auction_id})),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// 경매 취소 요청 본문
#[derive(Debug, Deserialize)]
pub struct CancelAuctionRequest {
    pub reason: String,
}

/// 경매 취소 요청 처리
pub async fn handle_cancel_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(body): Json<CancelAuctionRequest>,
) -> impl IntoResponse {
    match command_handle_cancel(
        auction_id,
        body.reason,
        state.repo.as_ref(),
        state.dispatcher.as_ref(),
        state.clock.as_ref(),
    )
    .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "경매가 취소되었습니다.", "auction_id": auction_id})),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let auction_id = cmd.auction_id;
    let bid_amount = cmd.amount;

    match handle_place_bid(
        cmd,
        state.repo.as_ref(),
        state.dispatcher.as_ref(),
        state.clock.as_ref(),
    )
    .await
    {
        Ok(bid_id) => {
            // 프록시 경쟁 반영 후의 현재 가격을 함께 돌려준다
            let current_high_bid =
                query::handlers::get_current_high_bid(&state.db_manager, auction_id)
                    .await
                    .ok();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": "입찰이 성공적으로 처리되었습니다.",
                    "bid_id": bid_id,
                    "bid_amount": bid_amount,
                    "current_high_bid": current_high_bid
                })),
            )
                .into_response()
        }
        Err(e) => engine_error_response(e),
    }
}

/// 즉시 구매 요청 처리
pub async fn handle_buy_now(
    State(state): State<AppState>,
    Json(cmd): Json<BuyNowCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);

    let auction_id = cmd.auction_id;
    match command_handle_buy_now(
        cmd,
        state.repo.as_ref(),
        state.dispatcher.as_ref(),
        state.clock.as_ref(),
    )
    .await
    {
        Ok(bid_id) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "즉시 구매가 성공적으로 처리되었습니다.",
                "auction_id": auction_id,
                "bid_id": bid_id
            })),
        )
            .into_response(),
        Err(e) => engine_error_response(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 상태 조회
pub async fn handle_get_auction_state(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 상태 조회 id: {}", "HandlerQuery", auction_id);
    match query::handlers::get_auction_state(&state.db_manager, auction_id).await {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 모든 경매 조회
pub async fn handle_get_auctions(State(state): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    match query::handlers::get_all_auctions(&state.db_manager).await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 최고 입찰가 조회 id: {}",
        "HandlerQuery", auction_id
    );
    match query::handlers::get_highest_bid(&state.db_manager, auction_id).await {
        Ok(bid) => Json(bid).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    match query::handlers::get_bid_history(&state.db_manager, auction_id).await {
        Ok(history) => Json(history).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// endregion: --- Query Handlers
