//! 공통 에러 타입.
//!
//! 도구 모음 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum OwlError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 증권사/데이터 제공자 에러
    #[error("거래소 에러: {0}")]
    Exchange(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 인증 에러
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),
}

/// 공통 Result 타입.
pub type OwlResult<T> = Result<T, OwlError>;

impl OwlError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OwlError::Network(_))
    }
}

impl From<serde_json::Error> for OwlError {
    fn from(err: serde_json::Error) -> Self {
        OwlError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for OwlError {
    fn from(err: config::ConfigError) -> Self {
        OwlError::Config(err.to_string())
    }
}
