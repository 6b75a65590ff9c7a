//! 분석 에러 타입.

use owlman_core::OwlError;
use owlman_exchange::ExchangeError;
use thiserror::Error;

use crate::indicators::IndicatorError;

/// 분석 계층 에러.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 데이터 부족
    #[error("데이터 부족: {0}")]
    InsufficientData(String),

    /// 지표 계산 에러
    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    /// 외부 데이터 조회 에러
    #[error("데이터 조회 실패: {0}")]
    Exchange(#[from] ExchangeError),

    /// 테이블 생성/저장 에러
    #[error("테이블 에러: {0}")]
    Table(#[from] polars::prelude::PolarsError),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 분석 Result 타입.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

impl From<AnalyticsError> for OwlError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Exchange(e) => e.into(),
            AnalyticsError::InvalidParameter(msg) => OwlError::InvalidInput(msg),
            other => OwlError::Data(other.to_string()),
        }
    }
}
