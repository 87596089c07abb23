// region:    --- Imports
use crate::auth::{AllowAll, SharedAdminPolicy};
use crate::bidding::serializer::ItemLocks;
use crate::notifier::BroadcastNotifier;
use crate::scheduler::TimeScheduler;
use crate::store::ItemStore;
use axum::http::HeaderValue;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod auth;
mod bidding;
mod error;
mod handlers;
mod lifecycle;
mod notifier;
mod query;
mod scheduler;
mod store;
mod ws;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 인메모리 상품 저장소와 입찰 직렬화 락 생성
    let store = Arc::new(ItemStore::new());
    let locks = Arc::new(ItemLocks::new());

    // 브로드캐스트 통지기 생성
    let notifier = Arc::new(BroadcastNotifier::new(256));

    // 서버 시각 브로드캐스트 시작
    let scheduler = TimeScheduler::new(Arc::clone(&notifier));
    scheduler.start().await;

    // 클라이언트 페이지를 위한 cors 설정 (CLIENT_URL 미지정 시 전체 허용)
    let cors = match std::env::var("CLIENT_URL") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    // 라우터 설정
    let policy: SharedAdminPolicy = Arc::new(AllowAll);
    let routes_all = handlers::routes((store, locks, notifier, policy)).layer(cors);

    // 리스너 생성
    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
