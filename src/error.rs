// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error
/// 경매 도메인 오류
/// 모든 변형은 호출 경계에서 복구 가능하며 프로세스를 종료시키지 않는다.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuctionError {
    /// 상품 생성 입력값 오류
    #[error("{0}")]
    InvalidArgument(String),

    #[error("상품을 찾을 수 없습니다.")]
    NotFound,

    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,

    /// 진행 중인 경매에 대한 중복 시작 요청
    #[error("경매가 이미 진행 중입니다.")]
    AlreadyActive,

    #[error("경매가 이미 종료되었습니다.")]
    Ended,

    /// 현재 가격 이하의 입찰 (동일 금액 포함)
    #[error("입찰 금액이 낮습니다. 현재 가격은 {current_bid}입니다.")]
    BidTooLow { current_bid: i64 },

    #[error("내부 오류: {0}")]
    Internal(String),
}

impl AuctionError {
    /// 클라이언트용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AuctionError::NotFound => "NOT_FOUND",
            AuctionError::NotStarted => "NOT_STARTED",
            AuctionError::AlreadyActive => "ALREADY_ACTIVE",
            AuctionError::Ended => "ALREADY_ENDED",
            AuctionError::BidTooLow { .. } => "LOW_BID",
            AuctionError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    pub fn status(&self) -> StatusCode {
        match self {
            AuctionError::NotFound => StatusCode::NOT_FOUND,
            AuctionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// 오류 응답 바디
    pub fn to_body(&self) -> Value {
        match self {
            AuctionError::BidTooLow { current_bid } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "current_bid": current_bid,
            }),
            _ => json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
// endregion: --- Auction Error
