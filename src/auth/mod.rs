/// 관리자 권한 훅
/// 표시 이름을 특정 단어와 비교하는 식의 권한 우회 대신 교체 가능한 정책 지점을 둔다.
/// 기본 정책은 모든 요청을 허용한다.
// region:    --- Imports
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Admin Policy
pub trait AdminPolicy: Send + Sync {
    /// 관리자 명령 허용 여부
    fn authorize(&self, actor: Option<&str>) -> bool;
}

/// 모든 요청을 허용하는 기본 정책
#[derive(Debug, Default, Clone)]
pub struct AllowAll;

impl AdminPolicy for AllowAll {
    fn authorize(&self, _actor: Option<&str>) -> bool {
        true
    }
}

pub type SharedAdminPolicy = Arc<dyn AdminPolicy>;
// endregion: --- Admin Policy
