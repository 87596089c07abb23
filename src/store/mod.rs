/// 인메모리 상품 저장소
/// 프로세스 단위의 단일 소유 경계이며 재시작 시 모든 상태가 사라진다.
/// 각 연산은 개별적으로 원자적이고, 연산 사이의 직렬화는 입찰 직렬화 락의 몫이다.
// region:    --- Imports
use crate::bidding::model::{BidAccepted, BidRecord, Item, ItemSnapshot};
use crate::error::AuctionError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Item Store
pub struct ItemStore {
    items: RwLock<Vec<Item>>,
    next_id: AtomicU64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    /// 저장소 생성
    pub fn new() -> Self {
        ItemStore {
            items: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 모든 상품 스냅샷 조회 (등록 순서)
    pub async fn list_items(&self) -> Vec<ItemSnapshot> {
        self.items.read().await.iter().map(Item::snapshot).collect()
    }

    /// 상품 생성
    /// 새 id를 발급하고 현재 가격을 시작가로 초기화한다.
    /// 삭제 경로가 없으므로 id는 재사용되지 않는다.
    pub async fn create_item(
        &self,
        title: &str,
        starting_price: i64,
        duration_min: i64,
    ) -> Result<ItemSnapshot, AuctionError> {
        if title.trim().is_empty() {
            return Err(AuctionError::InvalidArgument(
                "상품명은 비어 있을 수 없습니다.".to_string(),
            ));
        }
        if starting_price <= 0 {
            return Err(AuctionError::InvalidArgument(
                "시작가는 0보다 커야 합니다.".to_string(),
            ));
        }
        if duration_min <= 0 {
            return Err(AuctionError::InvalidArgument(
                "경매 시간은 0보다 커야 합니다.".to_string(),
            ));
        }

        let item = Item {
            id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
            title: title.trim().to_string(),
            starting_price,
            current_bid: starting_price,
            duration_min,
            auction_end_time: None,
            highest_bidder: None,
            bidder_conn_id: None,
            created_at: Utc::now(),
            bid_history: HashMap::new(),
        };
        let snapshot = item.snapshot();
        self.items.write().await.push(item);
        Ok(snapshot)
    }

    /// 상품 조회
    pub async fn get_item(&self, item_id: &str) -> Result<ItemSnapshot, AuctionError> {
        self.items
            .read()
            .await
            .iter()
            .find(|i| i.id == item_id)
            .map(Item::snapshot)
            .ok_or(AuctionError::NotFound)
    }

    /// 입찰 반영
    /// 검증은 호출자(입찰 직렬화기)가 이미 마친 상태여야 하며 여기서는 무조건 반영한다.
    /// 현재 가격, 최고 입찰자, 접속 핸들 갱신과 기록 추가가 한 쓰기 구간에서 이루어진다.
    pub async fn record_bid(
        &self,
        item_id: &str,
        bidder_name: &str,
        amount: i64,
        conn_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<BidAccepted, AuctionError> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(AuctionError::NotFound)?;

        let previous_bidder_conn_id = item.bidder_conn_id.take();
        item.current_bid = amount;
        item.highest_bidder = Some(bidder_name.to_string());
        item.bidder_conn_id = conn_id;
        item.bid_history
            .entry(bidder_name.to_string())
            .or_default()
            .push(BidRecord { amount, timestamp });

        Ok(BidAccepted {
            item_id: item.id.clone(),
            current_bid: item.current_bid,
            highest_bidder: bidder_name.to_string(),
            bidder_conn_id: item.bidder_conn_id.clone(),
            previous_bidder_conn_id,
        })
    }

    /// 경매 종료 시각 기록
    /// 중복 시작 검증은 호출자(경매 수명주기 컨트롤러)의 몫이다.
    pub async fn arm_auction(
        &self,
        item_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<ItemSnapshot, AuctionError> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(AuctionError::NotFound)?;
        item.auction_end_time = Some(end_time);
        Ok(item.snapshot())
    }

    /// 상품별 사용자 입찰 이력 조회 (입찰자 이름 -> 기록 목록)
    pub async fn get_user_bids(
        &self,
        item_id: &str,
    ) -> Result<HashMap<String, Vec<BidRecord>>, AuctionError> {
        self.items
            .read()
            .await
            .iter()
            .find(|i| i.id == item_id)
            .map(|i| i.bid_history.clone())
            .ok_or(AuctionError::NotFound)
    }
}
// endregion: --- Item Store
