/// 브로드캐스트 통지기
/// 코어가 발행한 상태 변경 이벤트를 접속 중인 모든 관찰자에게 중계한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;

// endregion: --- Imports

// region:    --- Event Sink Trait
/// 이벤트 발행 트레이트
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: AuctionEvent);
}
// endregion: --- Event Sink Trait

// region:    --- Broadcast Notifier
/// 프로세스 내 broadcast 채널 기반 통지기
/// 관찰자마다 subscribe 로 전용 수신기를 받는다.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<AuctionEvent>,
}

impl BroadcastNotifier {
    /// capacity 건까지 버퍼링하는 통지기 생성
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        BroadcastNotifier { sender }
    }

    /// 관찰자 구독 등록
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for BroadcastNotifier {
    async fn publish(&self, event: AuctionEvent) {
        // 수신자가 하나도 없을 때의 전송 오류는 무시한다
        let _ = self.sender.send(event);
    }
}
// endregion: --- Broadcast Notifier
