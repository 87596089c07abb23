use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// 상품 모델 (저장소 내부 표현)
#[derive(Debug, Clone)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub starting_price: i64,
    pub current_bid: i64,
    pub duration_min: i64,
    pub auction_end_time: Option<DateTime<Utc>>,
    pub highest_bidder: Option<String>,
    pub bidder_conn_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub bid_history: HashMap<String, Vec<BidRecord>>,
}

impl Item {
    /// 조회 시점의 읽기 전용 스냅샷 생성
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id.clone(),
            title: self.title.clone(),
            starting_price: self.starting_price,
            current_bid: self.current_bid,
            duration: self.duration_min,
            auction_end_time: self.auction_end_time.map(|t| t.timestamp_millis()),
            highest_bidder: self.highest_bidder.clone(),
            bidder_conn_id: self.bidder_conn_id.clone(),
        }
    }
}

// 상품 스냅샷 모델 (시각은 밀리초 epoch, 시작 전이면 null)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: String,
    pub title: String,
    pub starting_price: i64,
    pub current_bid: i64,
    pub duration: i64,
    pub auction_end_time: Option<i64>,
    pub highest_bidder: Option<String>,
    pub bidder_conn_id: Option<String>,
}

// 입찰 기록 모델 (추가 전용, 수정과 삭제 없음)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidRecord {
    pub amount: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

// 입찰 수락 결과 모델
// 밀려난 선두에게 통지를 보낼 수 있도록 이전 접속 핸들을 함께 담는다.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BidAccepted {
    pub item_id: String,
    pub current_bid: i64,
    pub highest_bidder: String,
    pub bidder_conn_id: Option<String>,
    pub previous_bidder_conn_id: Option<String>,
}
