//! 스크리닝 및 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 모멘텀 점수, True Range, ATR 기반 위험도
//! - True Range 상관행렬과 계층적 군집화
//! - 상관계수 2차원 산점도 (PCA)
//! - 군집별 후보 선정 및 진입 금액 산출
//! - 채권 매매 손익 계산
//! - 결과 테이블(polars) 생성과 CSV 저장
//!
//! [`helper::TradingHelper`]가 계좌 조회부터 진입 테이블까지 전체 흐름을 묶습니다.

pub mod bond;
pub mod cluster;
pub mod correlation;
pub mod error;
pub mod helper;
pub mod indicators;
pub mod pca;
pub mod screening;
pub mod stats;
pub mod table;

pub use bond::{
    BondAnalyzer, BondLot, BondTradeRecord, EarningPrediction, PredictParams, BOND_PRODUCT_TYPE,
};
pub use cluster::{agglomerative_cluster, ClusterAssignment};
pub use correlation::{correlation_matrix, pearson_pairwise, CorrelationMatrix, TrueRangeFrame};
pub use error::{AnalyticsError, AnalyticsResult};
pub use helper::{investable_budget, HelperParams, TradingHelper};
pub use indicators::{momentum_score, risk_estimate, true_range, IndicatorError};
pub use pca::{correlation_scatter, ScatterPoint};
pub use screening::{build_screen_table, Candidate, ScreenParams, ScreenRow};
pub use stats::FetchStats;
