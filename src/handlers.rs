// region:    --- Imports
use crate::auth::SharedAdminPolicy;
use crate::bidding::commands::{
    handle_place_bid, CreateItemCommand, PlaceBidCommand, StartAuctionCommand,
};
use crate::bidding::serializer::ItemLocks;
use crate::error::AuctionError;
use crate::lifecycle;
use crate::notifier::BroadcastNotifier;
use crate::query;
use crate::store::ItemStore;
use crate::ws;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State
/// 라우터 전역 상태
pub type AppState = (
    Arc<ItemStore>,
    Arc<ItemLocks>,
    Arc<BroadcastNotifier>,
    SharedAdminPolicy,
);
// endregion: --- App State

// region:    --- Router
/// 전체 라우터 구성
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/bid", post(handle_bid))
        .route("/items", get(handle_get_items))
        .route("/items/:id", get(handle_get_item))
        .route("/items/:id/bids", get(handle_get_item_bids))
        .route("/server-time", get(handle_get_server_time))
        .route("/admin/items", post(handle_create_item))
        .route("/admin/items/:id/start", post(handle_start_auction))
        .route("/ws", get(ws::handle_upgrade))
        .with_state(state)
}
// endregion: --- Router

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State((store, locks, notifier, _)): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    if cmd.user_name.trim().is_empty() {
        return AuctionError::InvalidArgument("입찰자 이름은 비어 있을 수 없습니다.".to_string())
            .into_response();
    }

    match handle_place_bid(cmd, &store, &locks, notifier.as_ref()).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "입찰이 성공적으로 처리되었습니다.",
                "itemId": accepted.item_id,
                "currentBid": accepted.current_bid,
                "highestBidder": accepted.highest_bidder,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 상품 생성 요청 처리 (관리자)
pub async fn handle_create_item(
    State((store, _, notifier, policy)): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateItemCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 생성 요청 처리 시작: {:?}", "Command", cmd);

    if !policy.authorize(actor_name(&headers).as_deref()) {
        return forbidden();
    }

    match lifecycle::create_item(cmd, &store, notifier.as_ref()).await {
        Ok(item) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "item": item })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 시작 요청 처리 (관리자)
pub async fn handle_start_auction(
    State((store, locks, notifier, policy)): State<AppState>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
    cmd: Option<Json<StartAuctionCommand>>,
) -> impl IntoResponse {
    // 바디가 없으면 기본 명령으로 처리한다
    let cmd = cmd.map(|Json(c)| c).unwrap_or_default();
    info!(
        "{:<12} --> 경매 시작 요청 처리 시작 id: {}, {:?}",
        "Command", item_id, cmd
    );

    if !policy.authorize(actor_name(&headers).as_deref()) {
        return forbidden();
    }

    match lifecycle::start_auction(&item_id, cmd, &store, &locks, notifier.as_ref()).await {
        Ok(item) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "item": item })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 요청 헤더에서 행위자 이름 추출
fn actor_name(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-actor-name")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// 관리자 권한 거절 응답
fn forbidden() -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({
            "error": "관리자 권한이 없습니다.",
            "code": "FORBIDDEN",
        })),
    )
        .into_response()
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 상품 조회
pub async fn handle_get_items(
    State((store, _, _, _)): State<AppState>,
) -> impl IntoResponse {
    info!("{:<12} --> 모든 상품 조회", "HandlerQuery");
    Json(query::handlers::get_all_items(&store).await)
}

/// 상품 조회
pub async fn handle_get_item(
    State((store, _, _, _)): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_item(&store, &item_id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 상품별 사용자 입찰 이력 조회
pub async fn handle_get_item_bids(
    State((store, _, _, _)): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 상품 입찰 이력 조회 id: {}",
        "HandlerQuery", item_id
    );
    match query::handlers::get_user_bids(&store, &item_id).await {
        Ok(user_bids) => Json(serde_json::json!({
            "success": true,
            "userBids": user_bids,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 서버 시각 조회 (클라이언트 시계 동기화용)
pub async fn handle_get_server_time() -> impl IntoResponse {
    Json(serde_json::json!({ "serverTime": Utc::now().timestamp_millis() }))
}

// endregion: --- Query Handlers
