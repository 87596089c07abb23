// region:    --- Imports
use crate::bidding::model::{BidRecord, ItemSnapshot};
use crate::error::AuctionError;
use crate::store::ItemStore;
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 모든 상품 조회
pub async fn get_all_items(store: &ItemStore) -> Vec<ItemSnapshot> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    store.list_items().await
}

/// 상품 조회
pub async fn get_item(store: &ItemStore, item_id: &str) -> Result<ItemSnapshot, AuctionError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    store.get_item(item_id).await
}

/// 상품별 사용자 입찰 이력 조회
pub async fn get_user_bids(
    store: &ItemStore,
    item_id: &str,
) -> Result<HashMap<String, Vec<BidRecord>>, AuctionError> {
    info!("{:<12} --> 사용자 입찰 이력 조회 id: {}", "Query", item_id);
    store.get_user_bids(item_id).await
}

// endregion: --- Query Handlers
