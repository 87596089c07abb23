/// 입찰 관련 커맨드 처리
/// 1. 입찰 (상품 단위 직렬화 후 재검증하여 반영)
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::bidding::model::{BidAccepted, ItemSnapshot};
use crate::bidding::serializer::ItemLocks;
use crate::error::AuctionError;
use crate::notifier::EventSink;
use crate::store::ItemStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub item_id: String,
    pub bid_amount: i64,
    pub user_name: String,
    #[serde(default)]
    pub conn_id: Option<String>,
}

/// 상품 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemCommand {
    pub title: String,
    pub starting_price: i64,
    pub duration: i64,
}

/// 경매 시작 명령
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartAuctionCommand {
    #[serde(default)]
    pub duration: Option<i64>,
}

/// 1. 입찰
/// 같은 상품에서 진행 중인 입찰이 끝날 때까지 기다린 뒤 최신 상태로 재검증하고 반영한다.
/// 기다리는 동안 다른 입찰이 가격을 올렸을 수 있으므로 재검증은 생략할 수 없고,
/// 거절 사유는 재검증 시점의 사유로 보고한다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &ItemStore,
    locks: &ItemLocks,
    event_sink: &impl EventSink,
) -> Result<BidAccepted, AuctionError> {
    // 1차 검증: 명백히 무효한 입찰은 줄을 서기 전에 거절한다
    let item = store.get_item(&cmd.item_id).await?;
    validate_bid(&item, cmd.bid_amount, Utc::now())?;

    // 상품 단위 배타 구간 진입
    let _guard = locks.acquire(&cmd.item_id).await;

    // 재검증
    let item = store.get_item(&cmd.item_id).await?;
    let now = Utc::now();
    validate_bid(&item, cmd.bid_amount, now)?;

    // 반영
    let accepted = store
        .record_bid(
            &cmd.item_id,
            &cmd.user_name,
            cmd.bid_amount,
            cmd.conn_id.clone(),
            now,
        )
        .await?;

    // 상태 변경 이벤트 발행
    event_sink.publish(AuctionEvent::update_bid(&accepted)).await;
    event_sink
        .publish(AuctionEvent::ItemsUpdate(store.list_items().await))
        .await;

    Ok(accepted)
}

/// 입찰 유효성 검증
/// 종료 시각이 설정되어 있고, 아직 지나지 않았고, 금액이 현재 가격을 초과해야 한다.
/// 동일 금액은 거절한다.
fn validate_bid(
    item: &ItemSnapshot,
    bid_amount: i64,
    now: DateTime<Utc>,
) -> Result<(), AuctionError> {
    let end_time = item.auction_end_time.ok_or(AuctionError::NotStarted)?;
    if now.timestamp_millis() >= end_time {
        return Err(AuctionError::Ended);
    }
    if bid_amount <= item.current_bid {
        return Err(AuctionError::BidTooLow {
            current_bid: item.current_bid,
        });
    }
    Ok(())
}
// endregion: --- Commands
