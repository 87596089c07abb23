use crate::bidding::model::{BidAccepted, ItemSnapshot};
use serde::{Deserialize, Serialize};

/// 코어가 발행하고 브로드캐스트 통지기가 모든 관찰자에게 중계하는 상태 변경 이벤트
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "data")]
pub enum AuctionEvent {
    // 전체 상품 스냅샷 갱신 (생성, 시작, 입찰 수락 후)
    #[serde(rename = "items_update")]
    ItemsUpdate(Vec<ItemSnapshot>),

    // 입찰 수락 (수락 건당 한 번)
    #[serde(rename = "UPDATE_BID", rename_all = "camelCase")]
    UpdateBid {
        item_id: String,
        current_bid: i64,
        highest_bidder: String,
        bidder_conn_id: Option<String>,
        previous_bidder_conn_id: Option<String>,
    },

    // 클라이언트 카운트다운 동기화용 서버 시각 (밀리초 epoch)
    #[serde(rename = "server_time", rename_all = "camelCase")]
    ServerTime { server_time: i64 },
}

impl AuctionEvent {
    /// 입찰 수락 결과로부터 UPDATE_BID 이벤트 생성
    pub fn update_bid(accepted: &BidAccepted) -> Self {
        AuctionEvent::UpdateBid {
            item_id: accepted.item_id.clone(),
            current_bid: accepted.current_bid,
            highest_bidder: accepted.highest_bidder.clone(),
            bidder_conn_id: accepted.bidder_conn_id.clone(),
            previous_bidder_conn_id: accepted.previous_bidder_conn_id.clone(),
        }
    }
}
