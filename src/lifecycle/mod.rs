/// 경매 수명주기 컨트롤러
/// 시작 전 -> 진행 중 -> 종료 전이를 담당한다.
/// 진행 여부는 저장된 플래그가 아니라 종료 시각과 현재 시각으로 매번 계산한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::bidding::commands::{CreateItemCommand, StartAuctionCommand};
use crate::bidding::model::ItemSnapshot;
use crate::bidding::serializer::ItemLocks;
use crate::error::AuctionError;
use crate::notifier::EventSink;
use crate::store::ItemStore;
use chrono::{DateTime, Duration, Utc};

// endregion: --- Imports

// region:    --- Lifecycle
/// 기본 경매 시간(분)
const DEFAULT_DURATION_MIN: i64 = 1;

/// 기본 경매 시간 조회 (DEFAULT_AUCTION_DURATION 환경 변수로 재정의)
pub fn default_duration_min() -> i64 {
    std::env::var("DEFAULT_AUCTION_DURATION")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_DURATION_MIN)
}

/// 상품 생성 (관리자 명령)
pub async fn create_item(
    cmd: CreateItemCommand,
    store: &ItemStore,
    event_sink: &impl EventSink,
) -> Result<ItemSnapshot, AuctionError> {
    let item = store
        .create_item(&cmd.title, cmd.starting_price, cmd.duration)
        .await?;
    event_sink
        .publish(AuctionEvent::ItemsUpdate(store.list_items().await))
        .await;
    Ok(item)
}

/// 경매 시작 (관리자 명령)
/// 종료 시각 = 현재 시각 + (요청값 | 상품에 저장된 값 | 기본값)분.
/// 진행 중이면 거절하고 종료 시각은 바꾸지 않는다.
/// 종료된 경매를 다시 시작하면 종료 시각이 재설정된다(원래 동작 유지).
pub async fn start_auction(
    item_id: &str,
    cmd: StartAuctionCommand,
    store: &ItemStore,
    locks: &ItemLocks,
    event_sink: &impl EventSink,
) -> Result<ItemSnapshot, AuctionError> {
    // 종료 직전의 입찰과 경합하지 않도록 입찰과 같은 배타 구간을 쓴다
    let _guard = locks.acquire(item_id).await;

    let item = store.get_item(item_id).await?;
    let now = Utc::now();
    if is_active(&item, now) {
        return Err(AuctionError::AlreadyActive);
    }

    let minutes = match cmd.duration {
        Some(d) if d <= 0 => {
            return Err(AuctionError::InvalidArgument(
                "경매 시간은 0보다 커야 합니다.".to_string(),
            ))
        }
        Some(d) => d,
        None if item.duration > 0 => item.duration,
        None => default_duration_min(),
    };

    let end_time = now
        .checked_add_signed(Duration::minutes(minutes))
        .ok_or_else(|| AuctionError::Internal("종료 시각 계산 범위 초과".to_string()))?;

    let updated = store.arm_auction(item_id, end_time).await?;
    event_sink
        .publish(AuctionEvent::ItemsUpdate(store.list_items().await))
        .await;
    Ok(updated)
}

/// 시작 전 여부
pub fn is_not_started(item: &ItemSnapshot) -> bool {
    item.auction_end_time.is_none()
}

/// 진행 중 여부
pub fn is_active(item: &ItemSnapshot, now: DateTime<Utc>) -> bool {
    matches!(item.auction_end_time, Some(end) if now.timestamp_millis() < end)
}

/// 종료 여부
pub fn is_ended(item: &ItemSnapshot, now: DateTime<Utc>) -> bool {
    matches!(item.auction_end_time, Some(end) if now.timestamp_millis() >= end)
}
// endregion: --- Lifecycle
