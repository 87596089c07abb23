/// 서버 시각 브로드캐스트 스케줄러
/// 클라이언트 카운트다운이 서버 시계에 맞춰 돌도록 1초마다 서버 시각을 내보낸다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::notifier::{BroadcastNotifier, EventSink};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::debug;

// endregion: --- Imports

// region:    --- Time Scheduler
pub struct TimeScheduler {
    notifier: Arc<BroadcastNotifier>,
}

impl TimeScheduler {
    pub fn new(notifier: Arc<BroadcastNotifier>) -> Self {
        Self { notifier }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                notifier
                    .publish(AuctionEvent::ServerTime {
                        server_time: Utc::now().timestamp_millis(),
                    })
                    .await;
                debug!("{:<12} --> 서버 시각 브로드캐스트", "Scheduler");
            }
        });
    }
}
// endregion: --- Time Scheduler
