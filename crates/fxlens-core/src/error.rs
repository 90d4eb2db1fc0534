//! fxlens 파이프라인의 에러 타입.
//!
//! 이 모듈은 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 파이프라인 에러.
#[derive(Debug, Error)]
pub enum FxError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 외부 제공자 에러
    #[error("제공자 에러: {0}")]
    Provider(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type FxResult<T> = Result<T, FxError>;

impl FxError {
    /// 폴백 값으로 복구 가능한 에러인지 확인합니다.
    ///
    /// 제공자/네트워크 계열 에러는 사이클을 중단시키지 않고
    /// 통화별 폴백 상수로 대체됩니다.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            FxError::Provider(_) | FxError::Network(_) | FxError::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        FxError::Serialization(err.to_string())
    }
}
