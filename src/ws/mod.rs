/// 웹소켓 접속 처리
/// 접속 시 접속 식별자와 전체 스냅샷을 먼저 보내고,
/// 이후 한 펌프에서 브로드캐스트 이벤트 중계와 입찰 수신을 같이 처리한다.
/// bid_success / bid_error / outbid 는 해당 접속에만 보내고 절대 브로드캐스트하지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::bidding::serializer::ItemLocks;
use crate::handlers::AppState;
use crate::notifier::EventSink;
use crate::store::ItemStore;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Wire Messages
/// 클라이언트가 보내는 메시지
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "BID_PLACED", rename_all = "camelCase")]
    BidPlaced {
        item_id: String,
        bid_amount: i64,
        user_name: String,
    },
}

/// 특정 접속에만 보내는 응답 메시지
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DirectMessage {
    #[serde(rename = "connected", rename_all = "camelCase")]
    Connected { conn_id: String },

    #[serde(rename = "bid_success", rename_all = "camelCase")]
    BidSuccess { item_id: String, message: String },

    #[serde(rename = "bid_error", rename_all = "camelCase")]
    BidError {
        item_id: Option<String>,
        message: String,
        code: String,
    },

    // 선두를 빼앗긴 접속에만 보내는 통지
    #[serde(rename = "outbid", rename_all = "camelCase")]
    Outbid {
        item_id: String,
        current_bid: i64,
        highest_bidder: String,
    },
}
// endregion: --- Wire Messages

// region:    --- Socket Handler
/// 접속 식별자 발급 시퀀스
/// 접속 수명에만 묶인 휘발성 값이며 재접속 간에 의미를 갖지 않는다.
static CONN_SEQ: AtomicU64 = AtomicU64::new(1);

/// 웹소켓 업그레이드 처리
pub async fn handle_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 접속 단위 이벤트 펌프
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (store, locks, notifier, _) = state;
    let conn_id = format!("conn-{}", CONN_SEQ.fetch_add(1, Ordering::Relaxed));
    info!("{:<12} --> 클라이언트 접속: {}", "Socket", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let mut events = notifier.subscribe();

    // 접속 식별자와 초기 스냅샷 전송
    let connected = DirectMessage::Connected {
        conn_id: conn_id.clone(),
    };
    if send_json(&mut sender, &connected).await.is_err() {
        return;
    }
    let initial = AuctionEvent::ItemsUpdate(store.list_items().await);
    if send_json(&mut sender, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(notice) = outbid_notice(&event, &conn_id) {
                        if send_json(&mut sender, &notice).await.is_err() {
                            break;
                        }
                    }
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "{:<12} --> 이벤트 {}건 유실: {}",
                        "Socket", skipped, conn_id
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = next_message(&mut receiver) => match msg {
                Some(text) => {
                    let reply =
                        handle_client_message(&text, &conn_id, &store, &locks, notifier.as_ref())
                            .await;
                    if send_json(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!("{:<12} --> 클라이언트 접속 종료: {}", "Socket", conn_id);
}

/// 다음 텍스트 메시지 수신 (접속 종료나 오류면 None)
async fn next_message(receiver: &mut SplitStream<WebSocket>) -> Option<String> {
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => return Some(text),
            Some(Ok(Message::Close(_))) | None => return None,
            // ping/pong/바이너리는 무시
            Some(Ok(_)) => continue,
            Some(Err(_)) => return None,
        }
    }
}

/// 입찰 수락 이벤트에서 밀려난 선두가 이 접속이면 통지를 만든다
fn outbid_notice(event: &AuctionEvent, conn_id: &str) -> Option<DirectMessage> {
    match event {
        AuctionEvent::UpdateBid {
            item_id,
            current_bid,
            highest_bidder,
            previous_bidder_conn_id: Some(prev),
            ..
        } if prev == conn_id => Some(DirectMessage::Outbid {
            item_id: item_id.clone(),
            current_bid: *current_bid,
            highest_bidder: highest_bidder.clone(),
        }),
        _ => None,
    }
}

/// 클라이언트 메시지 처리
async fn handle_client_message(
    text: &str,
    conn_id: &str,
    store: &ItemStore,
    locks: &ItemLocks,
    event_sink: &impl EventSink,
) -> DirectMessage {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(_) => {
            return DirectMessage::BidError {
                item_id: None,
                message: "필수 필드가 누락되었거나 형식이 잘못되었습니다.".to_string(),
                code: "INVALID_ARGUMENT".to_string(),
            }
        }
    };

    match msg {
        ClientMessage::BidPlaced {
            item_id,
            bid_amount,
            user_name,
        } => {
            if user_name.trim().is_empty() {
                return DirectMessage::BidError {
                    item_id: Some(item_id),
                    message: "입찰자 이름은 비어 있을 수 없습니다.".to_string(),
                    code: "INVALID_ARGUMENT".to_string(),
                };
            }

            let cmd = PlaceBidCommand {
                item_id: item_id.clone(),
                bid_amount,
                user_name,
                conn_id: Some(conn_id.to_string()),
            };
            match handle_place_bid(cmd, store, locks, event_sink).await {
                Ok(accepted) => DirectMessage::BidSuccess {
                    item_id: accepted.item_id,
                    message: "입찰이 성공적으로 처리되었습니다.".to_string(),
                },
                Err(e) => DirectMessage::BidError {
                    item_id: Some(item_id),
                    message: e.to_string(),
                    code: e.code().to_string(),
                },
            }
        }
    }
}

/// 직렬화 후 전송 (직렬화 실패는 기록만 하고 접속은 유지)
async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: &T,
) -> Result<(), axum::Error> {
    match serde_json::to_string(payload) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            error!("{:<12} --> 직렬화 오류: {:?}", "Socket", e);
            Ok(())
        }
    }
}
// endregion: --- Socket Handler
