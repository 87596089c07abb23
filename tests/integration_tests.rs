use chrono::{Duration, Utc};
use realtime_auction_service::auction::events::AuctionEvent;
use realtime_auction_service::auth::{AdminPolicy, AllowAll, SharedAdminPolicy};
use realtime_auction_service::bidding::commands::{
    handle_place_bid, PlaceBidCommand, StartAuctionCommand,
};
use realtime_auction_service::bidding::serializer::ItemLocks;
use realtime_auction_service::error::AuctionError;
use realtime_auction_service::handlers;
use realtime_auction_service::lifecycle;
use realtime_auction_service::notifier::BroadcastNotifier;
use realtime_auction_service::store::ItemStore;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("트레이싱 구독자 설정 실패");
}

/// 임의 포트에 테스트 서버 기동
async fn spawn_app_with_policy(policy: SharedAdminPolicy) -> (String, Arc<ItemStore>) {
    let store = Arc::new(ItemStore::new());
    let locks = Arc::new(ItemLocks::new());
    let notifier = Arc::new(BroadcastNotifier::new(256));

    let app = handlers::routes((Arc::clone(&store), locks, notifier, policy));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("리스너 바인딩 실패");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (format!("http://{}", addr), store)
}

async fn spawn_app() -> (String, Arc<ItemStore>) {
    spawn_app_with_policy(Arc::new(AllowAll)).await
}

/// 테스트용 상품 생성
async fn create_test_item(
    base: &str,
    client: &Client,
    title: &str,
    starting_price: i64,
    duration: i64,
) -> Value {
    let response = client
        .post(format!("{}/admin/items", base))
        .json(&json!({
            "title": title,
            "startingPrice": starting_price,
            "duration": duration,
        }))
        .send()
        .await
        .expect("상품 생성 요청 실패");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    body["item"].clone()
}

/// 테스트용 경매 시작
async fn start_test_auction(
    base: &str,
    client: &Client,
    item_id: &str,
    duration: Option<i64>,
) -> reqwest::Response {
    let request = client.post(format!("{}/admin/items/{}/start", base, item_id));
    let request = match duration {
        Some(d) => request.json(&json!({ "duration": d })),
        None => request,
    };
    request.send().await.expect("경매 시작 요청 실패")
}

/// 테스트용 입찰 요청
async fn place_test_bid(
    base: &str,
    client: &Client,
    item_id: &str,
    bid_amount: i64,
    user_name: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/bid", base))
        .json(&json!({
            "itemId": item_id,
            "bidAmount": bid_amount,
            "userName": user_name,
        }))
        .send()
        .await
        .expect("입찰 요청 실패")
}

/// 상품 생성과 목록 조회 왕복 테스트
#[tokio::test]
async fn test_create_and_list_items() {
    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "도자기 화병", 75, 5).await;
    assert_eq!(item["currentBid"], 75);
    assert_eq!(item["startingPrice"], 75);
    assert!(item["auctionEndTime"].is_null());
    assert!(item["highestBidder"].is_null());

    let items: Value = client
        .get(format!("{}/items", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], item["id"]);
    assert_eq!(items[0]["currentBid"], 75);
    assert!(items[0]["auctionEndTime"].is_null());
}

/// 상품 생성 입력값 검증 테스트
#[tokio::test]
async fn test_create_item_validation() {
    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let cases = [
        json!({ "title": "", "startingPrice": 10, "duration": 5 }),
        json!({ "title": "의자", "startingPrice": 0, "duration": 5 }),
        json!({ "title": "의자", "startingPrice": 10, "duration": -1 }),
    ];
    for body in cases {
        let response = client
            .post(format!("{}/admin/items", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["code"], "INVALID_ARGUMENT");
    }
}

/// 경매 시작 테스트 (종료 시각 설정과 중복 시작 거절)
#[tokio::test]
async fn test_start_auction() {
    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "골동품 시계", 50, 1).await;
    let item_id = item["id"].as_str().unwrap();

    let response = start_test_auction(&base, &client, item_id, Some(5)).await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    let end_time = body["item"]["auctionEndTime"].as_i64().unwrap();

    // 종료 시각은 대략 지금 + 5분 (스케줄링 오차 허용)
    let expected = Utc::now().timestamp_millis() + 5 * 60 * 1000;
    assert!((end_time - expected).abs() < 10_000);

    // 이후 조회에서도 종료 시각이 고정되어 있다
    let fetched: Value = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["auctionEndTime"].as_i64().unwrap(), end_time);

    // 진행 중인 경매의 중복 시작은 거절되고 종료 시각은 그대로다
    let response = start_test_auction(&base, &client, item_id, Some(10)).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "ALREADY_ACTIVE");

    let fetched: Value = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["auctionEndTime"].as_i64().unwrap(), end_time);

    // 없는 상품 시작은 404
    let response = start_test_auction(&base, &client, "999", Some(5)).await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

/// 종료된 경매 재시작 테스트 (종료 시각 재설정, 기존 동작 유지)
#[tokio::test]
async fn test_restart_after_end_rearms() {
    let (base, store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "축음기", 100, 1).await;
    let item_id = item["id"].as_str().unwrap();

    // 종료 시각을 과거로 돌려 종료 상태를 만든다
    store
        .arm_auction(item_id, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();

    // 바디 없는 시작 요청은 상품에 저장된 시간으로 처리된다
    let response = start_test_auction(&base, &client, item_id, None).await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    let end_time = body["item"]["auctionEndTime"].as_i64().unwrap();
    assert!(end_time > Utc::now().timestamp_millis());
}

/// 입찰 흐름 테스트
#[tokio::test]
async fn test_place_bid() {
    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "유화 그림", 75, 5).await;
    let item_id = item["id"].as_str().unwrap();

    // 시작 전 입찰은 거절
    let response = place_test_bid(&base, &client, item_id, 100, "alice").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "NOT_STARTED");

    start_test_auction(&base, &client, item_id, Some(5)).await;

    // 정상 입찰
    let response = place_test_bid(&base, &client, item_id, 80, "alice").await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["currentBid"], 80);
    assert_eq!(body["highestBidder"], "alice");

    let fetched: Value = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["currentBid"], 80);
    assert_eq!(fetched["highestBidder"], "alice");

    // 동일 금액 입찰은 거절되고 현재 가격을 알려준다
    let response = place_test_bid(&base, &client, item_id, 80, "bob").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "LOW_BID");
    assert_eq!(error["current_bid"], 80);

    // 더 낮은 입찰도 거절
    let response = place_test_bid(&base, &client, item_id, 10, "bob").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    // 없는 상품 입찰은 404
    let response = place_test_bid(&base, &client, "999", 80, "bob").await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    // 이름 없는 입찰은 거절
    let response = place_test_bid(&base, &client, item_id, 90, "  ").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

/// 종료 후 입찰 거절 테스트
#[tokio::test]
async fn test_bid_after_end_rejected() {
    let (base, store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "빈티지 카메라", 60, 1).await;
    let item_id = item["id"].as_str().unwrap();

    // 종료 시각이 이미 지난 상태로 만든다
    store
        .arm_auction(item_id, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();

    let response = place_test_bid(&base, &client, item_id, 100, "alice").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "ALREADY_ENDED");
}

/// 사용자 입찰 이력 조회 테스트
/// 약정 금액은 기록의 합이 아니라 최대 수락 금액이다.
#[tokio::test]
async fn test_user_bids_for_item() {
    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "은촛대", 50, 5).await;
    let item_id = item["id"].as_str().unwrap();
    start_test_auction(&base, &client, item_id, Some(5)).await;

    place_test_bid(&base, &client, item_id, 60, "alice").await;
    place_test_bid(&base, &client, item_id, 70, "alice").await;

    let body: Value = client
        .get(format!("{}/items/{}/bids", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);

    let records = body["userBids"]["alice"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["amount"], 60);
    assert_eq!(records[1]["amount"], 70);

    let commitment = records
        .iter()
        .map(|r| r["amount"].as_i64().unwrap())
        .max()
        .unwrap();
    assert_eq!(commitment, 70);

    // 없는 상품 이력 조회는 404
    let response = client
        .get(format!("{}/items/999/bids", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

/// 관리자 정책 훅 테스트 (거절 정책이면 관리자 명령은 403)
#[tokio::test]
async fn test_admin_policy_denies() {
    struct DenyAll;
    impl AdminPolicy for DenyAll {
        fn authorize(&self, _actor: Option<&str>) -> bool {
            false
        }
    }

    let (base, _store) = spawn_app_with_policy(Arc::new(DenyAll)).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/admin/items", base))
        .json(&json!({ "title": "의자", "startingPrice": 10, "duration": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
}

/// 동시성 입찰 테스트
/// 모든 입찰이 상품 단위로 직렬화되어 최종 가격은 항상 최댓값이 된다.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_bidding() {
    // 테스트 시작 시 tracing 초기화
    init_tracing();

    let (base, _store) = spawn_app().await;
    let client = Client::new();

    let item = create_test_item(&base, &client, "동시성 입찰 테스트 상품", 10000, 5).await;
    let item_id = item["id"].as_str().unwrap().to_string();
    start_test_auction(&base, &client, &item_id, Some(5)).await;

    // 50개의 동시 입찰 생성
    let mut handles = vec![];
    for i in 1..=50i64 {
        let client = Client::new();
        let base = base.clone();
        let item_id = item_id.clone();
        let bid_amount = 10000 + i * 1000;

        let handle = tokio::spawn(async move {
            let response = client
                .post(format!("{}/bid", base))
                .json(&json!({
                    "itemId": item_id,
                    "bidAmount": bid_amount,
                    "userName": format!("bidder-{}", i),
                }))
                .send()
                .await
                .unwrap();
            response.status()
        });

        handles.push(handle);
    }

    // 모든 입찰 처리 대기 및 결과 확인
    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == reqwest::StatusCode::OK {
            successful_bids += 1;
        } else {
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
            failed_bids += 1;
        }
    }

    info!(
        "성공한 입찰 수: {}, 실패한 입찰 수: {}",
        successful_bids, failed_bids
    );
    assert!(successful_bids >= 1);
    assert_eq!(successful_bids + failed_bids, 50);

    // 최종 가격은 항상 최댓값이다
    let fetched: Value = client
        .get(format!("{}/items/{}", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["currentBid"], 10000 + 50 * 1000);

    // 수락된 입찰당 기록이 정확히 하나씩 남는다
    let body: Value = client
        .get(format!("{}/items/{}/bids", base, item_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let total_records: usize = body["userBids"]
        .as_object()
        .unwrap()
        .values()
        .map(|records| records.as_array().unwrap().len())
        .sum();
    assert_eq!(total_records, successful_bids);
}

/// 근소 동시 입찰 경쟁 테스트
/// 60과 55가 동시에 도착해도 도착 순서와 무관하게 최종 가격은 60이다.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_bids_highest_wins() {
    let store = Arc::new(ItemStore::new());
    let locks = Arc::new(ItemLocks::new());
    let notifier = Arc::new(BroadcastNotifier::new(256));

    let item = store.create_item("경쟁 입찰 테스트 상품", 50, 5).await.unwrap();
    lifecycle::start_auction(
        &item.id,
        StartAuctionCommand::default(),
        &store,
        &locks,
        notifier.as_ref(),
    )
    .await
    .unwrap();

    let mut handles = vec![];
    for (user_name, bid_amount) in [("bob", 60i64), ("carol", 55i64)] {
        let store = Arc::clone(&store);
        let locks = Arc::clone(&locks);
        let notifier = Arc::clone(&notifier);
        let cmd = PlaceBidCommand {
            item_id: item.id.clone(),
            bid_amount,
            user_name: user_name.to_string(),
            conn_id: None,
        };
        handles.push(tokio::spawn(async move {
            handle_place_bid(cmd, &store, &locks, notifier.as_ref()).await
        }));
    }

    let mut results = vec![];
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let final_item = store.get_item(&item.id).await.unwrap();
    assert_eq!(final_item.current_bid, 60);
    assert_eq!(final_item.highest_bidder.as_deref(), Some("bob"));

    let accepted: Vec<i64> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|a| a.current_bid)
        .collect();
    assert!(accepted.contains(&60));

    // 60이 먼저 처리되었다면 55는 재검증 시점의 사유로 거절된다
    if accepted.len() == 1 {
        let rejection = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(rejection, &AuctionError::BidTooLow { current_bid: 60 });
    }
}

/// 상태 전이 판정 테스트 (저장된 플래그 없이 시각으로 계산)
#[tokio::test]
async fn test_lifecycle_predicates() {
    let store = ItemStore::new();
    let item = store.create_item("상태 전이 테스트 상품", 30, 5).await.unwrap();
    let now = Utc::now();

    assert!(lifecycle::is_not_started(&item));
    assert!(!lifecycle::is_active(&item, now));
    assert!(!lifecycle::is_ended(&item, now));

    let armed = store
        .arm_auction(&item.id, now + Duration::minutes(5))
        .await
        .unwrap();
    assert!(!lifecycle::is_not_started(&armed));
    assert!(lifecycle::is_active(&armed, now));
    assert!(!lifecycle::is_ended(&armed, now));

    let expired = store
        .arm_auction(&item.id, now - Duration::seconds(1))
        .await
        .unwrap();
    assert!(lifecycle::is_ended(&expired, now));
    assert!(!lifecycle::is_active(&expired, now));
}

/// 입찰 수락 이벤트 발행 테스트
/// 수락 건마다 UPDATE_BID 한 번과 전체 스냅샷 갱신이 차례로 발행된다.
#[tokio::test]
async fn test_bid_events_published() {
    let store = Arc::new(ItemStore::new());
    let locks = Arc::new(ItemLocks::new());
    let notifier = Arc::new(BroadcastNotifier::new(256));

    let item = store.create_item("이벤트 테스트 상품", 40, 5).await.unwrap();
    lifecycle::start_auction(
        &item.id,
        StartAuctionCommand::default(),
        &store,
        &locks,
        notifier.as_ref(),
    )
    .await
    .unwrap();

    let mut events = notifier.subscribe();

    let cmd = PlaceBidCommand {
        item_id: item.id.clone(),
        bid_amount: 45,
        user_name: "alice".to_string(),
        conn_id: Some("conn-1".to_string()),
    };
    handle_place_bid(cmd, &store, &locks, notifier.as_ref())
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        AuctionEvent::UpdateBid {
            item_id,
            current_bid,
            highest_bidder,
            bidder_conn_id,
            previous_bidder_conn_id,
        } => {
            assert_eq!(item_id, item.id);
            assert_eq!(current_bid, 45);
            assert_eq!(highest_bidder, "alice");
            assert_eq!(bidder_conn_id.as_deref(), Some("conn-1"));
            assert!(previous_bidder_conn_id.is_none());
        }
        other => panic!("UPDATE_BID 이벤트가 아님: {:?}", other),
    }

    match events.recv().await.unwrap() {
        AuctionEvent::ItemsUpdate(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].current_bid, 45);
        }
        other => panic!("items_update 이벤트가 아님: {:?}", other),
    }
}
