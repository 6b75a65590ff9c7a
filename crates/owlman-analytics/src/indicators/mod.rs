//! 기술적 지표 모듈.
//!
//! 스크리닝에 필요한 지표만 제공합니다.
//!
//! ## 모멘텀 지표
//! - **모멘텀 점수**: 다기간 가격 비율의 평균
//!
//! ## 변동성 지표
//! - **True Range**: 전일 종가를 포함한 일중 변동폭
//! - **위험도**: True Range의 지수 가중 평균(ATR)을 최근 종가로 나눈 값

pub mod momentum;
pub mod volatility;

use thiserror::Error;

pub use momentum::momentum_score;
pub use volatility::{ewm_mean, risk_estimate, true_range};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;
