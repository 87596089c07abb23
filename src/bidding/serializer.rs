/// 상품 단위 입찰 직렬화 락
/// 같은 상품에 대한 검증과 반영이 한 번에 하나만 진행되도록 보장한다.
// region:    --- Imports
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

// endregion: --- Imports

// region:    --- Item Locks
/// 상품 id별 비동기 뮤텍스 레지스트리
/// 상품은 삭제 경로가 없으므로 락 엔트리도 회수하지 않는다.
#[derive(Default)]
pub struct ItemLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        ItemLocks {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 상품 단위 배타 구간 획득
    /// 반환된 가드가 drop 되는 순간 어떤 경로로 빠져나가든 락이 풀린다.
    /// 서로 다른 상품의 입찰은 서로를 기다리지 않는다.
    pub async fn acquire(&self, item_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(item_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
// endregion: --- Item Locks
